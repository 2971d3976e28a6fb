//! Data models for conversation sessions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    /// Author of the message
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Assigned by the store on append when absent
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Message {
    /// Create a message timestamped now
    pub fn new(content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            user_id: user_id.into(),
            timestamp: Utc::now(),
            message_id: None,
            metadata: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Attach a metadata entry, creating the map on first use
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

/// Statistics derived from a session's retained history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub message_count: usize,
    /// Span between the earliest and latest message timestamps
    pub duration_seconds: f64,
    /// Distinct authors in first-seen order
    pub users: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl SessionStats {
    /// Stats for a session with no retained messages
    pub fn empty(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message_count: 0,
            duration_seconds: 0.0,
            users: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }

    pub fn from_messages(session_id: impl Into<String>, messages: &[Message]) -> Self {
        let session_id = session_id.into();
        let start = messages.iter().map(|m| m.timestamp).min();
        let end = messages.iter().map(|m| m.timestamp).max();
        let (Some(start), Some(end)) = (start, end) else {
            return Self::empty(session_id);
        };

        let mut users: Vec<String> = Vec::new();
        for message in messages {
            if !users.contains(&message.user_id) {
                users.push(message.user_id.clone());
            }
        }

        Self {
            session_id,
            message_count: messages.len(),
            duration_seconds: seconds(end - start),
            users,
            start_time: Some(start),
            end_time: Some(end),
        }
    }
}

fn seconds(span: chrono::Duration) -> f64 {
    match span.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => span.num_milliseconds() as f64 / 1000.0,
    }
}
