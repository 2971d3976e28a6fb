//! Bounded message log for a single session

use std::collections::VecDeque;

use crate::models::Message;

/// Default number of messages retained per session
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Number of messages returned by a window request when none is given
pub const DEFAULT_WINDOW: usize = 10;

/// Messages in append order, capped at `max_size`
///
/// When the cap is exceeded the oldest messages are dropped first.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: VecDeque<Message>,
    max_size: usize,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_size,
        }
    }

    /// Append a message, evicting from the front past the cap
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_size {
            self.messages.pop_front();
        }
    }

    /// The newest `count` messages, oldest first
    pub fn recent(&self, count: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(count);
        self.messages.range(start..).cloned().collect()
    }

    pub fn all(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Contents joined by newlines, in log order
    pub fn joined_content(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(n: usize, max: usize) -> MessageLog {
        let mut log = MessageLog::with_max_size(max);
        for i in 0..n {
            log.push(Message::new(format!("m{}", i), "u"));
        }
        log
    }

    #[test]
    fn test_evicts_oldest_first() {
        let log = log_with(5, 3);
        let contents: Vec<String> = log.all().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_recent_is_chronological() {
        let log = log_with(5, 10);
        let contents: Vec<String> = log.recent(2).into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["m3", "m4"]);
        assert_eq!(log.recent(50).len(), 5);
        assert!(log.recent(0).is_empty());
    }

    #[test]
    fn test_joined_content() {
        assert_eq!(log_with(3, 10).joined_content(), "m0\nm1\nm2");
        assert_eq!(MessageLog::new().joined_content(), "");
    }

    #[test]
    fn test_clear() {
        let mut log = log_with(3, 10);
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.max_size(), 10);
    }
}
