//! Conversation store: bounded per-session message logs

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;
use guardrail_safety::{GuardrailsEngine, SafetyMetadata, SafetyResult};
use tracing::{debug, warn};

use crate::{
    error::{SessionError, SessionResult},
    history::{MessageLog, DEFAULT_MAX_HISTORY},
    models::{Message, SessionStats},
};

/// Limits applied by a [`ConversationStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Messages retained per session
    pub max_history: usize,
    /// Sessions retained; the least recently appended-to session is evicted
    /// when a new one would exceed the cap
    pub max_sessions: Option<usize>,
    /// Sessions idle longer than this are treated as absent
    pub idle_ttl: Option<Duration>,
}

impl StoreConfig {
    pub fn validate(&self) -> SessionResult<()> {
        if self.max_history == 0 {
            return Err(SessionError::InvalidConfig(
                "max_history must be at least 1".to_string(),
            ));
        }
        if self.max_sessions == Some(0) {
            return Err(SessionError::InvalidConfig(
                "max_sessions must be at least 1".to_string(),
            ));
        }
        if self.idle_ttl == Some(Duration::ZERO) {
            return Err(SessionError::InvalidConfig(
                "idle_ttl must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            max_sessions: None,
            idle_ttl: None,
        }
    }
}

#[derive(Debug)]
struct Session {
    log: MessageLog,
    last_active: Instant,
}

impl Session {
    fn new(max_history: usize) -> Self {
        Self {
            log: MessageLog::with_max_size(max_history),
            last_active: Instant::now(),
        }
    }
}

/// Concurrent store of conversation sessions
///
/// Sessions are sharded by id, so appends to different sessions never
/// contend. Reads return cloned snapshots.
#[derive(Debug)]
pub struct ConversationStore {
    sessions: DashMap<String, Session>,
    config: StoreConfig,
    engine: Arc<GuardrailsEngine>,
    // Held while enforcing `max_sessions`
    eviction: Mutex<()>,
}

impl ConversationStore {
    /// Store with default limits evaluating through `engine`
    pub fn new(engine: Arc<GuardrailsEngine>) -> Self {
        Self {
            sessions: DashMap::new(),
            config: StoreConfig::default(),
            engine,
            eviction: Mutex::new(()),
        }
    }

    pub fn with_config(engine: Arc<GuardrailsEngine>, config: StoreConfig) -> SessionResult<Self> {
        config.validate()?;
        Ok(Self {
            sessions: DashMap::new(),
            config,
            engine,
            eviction: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<GuardrailsEngine> {
        &self.engine
    }

    /// Append `message` to a session and return the session id.
    ///
    /// A fresh UUID is used when `session_id` is `None`; the session is
    /// created on first append. A message without an id gets one.
    pub fn append(&self, mut message: Message, session_id: Option<&str>) -> String {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if message.message_id.is_none() {
            message.message_id = Some(uuid::Uuid::new_v4().to_string());
        }

        let created = {
            let mut created = false;
            let mut session = self.sessions.entry(session_id.clone()).or_insert_with(|| {
                created = true;
                Session::new(self.config.max_history)
            });
            if !created && self.is_expired(&session) {
                debug!("Session {} expired; starting a new history", session_id);
                session.log.clear();
            }
            session.log.push(message);
            session.last_active = Instant::now();
            created
        };

        if created {
            debug!("Created session {}", session_id);
            self.enforce_session_cap(&session_id);
        }

        session_id
    }

    /// The newest `size` messages of a session, oldest first
    pub fn window(&self, session_id: &str, size: usize) -> Vec<Message> {
        self.read(session_id, |log| log.recent(size))
            .unwrap_or_default()
    }

    /// Every retained message of a session
    pub fn full_history(&self, session_id: &str) -> Vec<Message> {
        self.read(session_id, MessageLog::all).unwrap_or_default()
    }

    /// Remove a session; returns whether a live session existed
    pub fn clear(&self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some((_, session)) => {
                debug!("Cleared session {}", session_id);
                !self.is_expired(&session)
            }
            None => false,
        }
    }

    /// Evaluate the whole retained conversation as one newline-joined text
    pub fn session_safety(&self, session_id: &str) -> SafetyResult {
        let snapshot = self.read(session_id, |log| (log.len(), log.joined_content()));

        let (message_count, result) = match snapshot {
            Some((count, content)) if count > 0 => {
                (count, self.engine.check_content(&content, None))
            }
            _ => (0, SafetyResult::clean()),
        };

        result.with_metadata(SafetyMetadata {
            context: None,
            session_id: Some(session_id.to_string()),
            message_count: Some(message_count),
        })
    }

    pub fn session_stats(&self, session_id: &str) -> SessionStats {
        SessionStats::from_messages(session_id, &self.full_history(session_id))
    }

    /// Ids of the live sessions, sorted
    pub fn list_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| !self.is_expired(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drop every session idle past the TTL; returns how many were removed
    pub fn evict_expired(&self) -> usize {
        if self.config.idle_ttl.is_none() {
            return 0;
        }
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !self.is_expired(session));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            warn!("Evicted {} idle session(s)", removed);
        }
        removed
    }

    /// Number of stored sessions, expired ones included until swept
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn read<T>(&self, session_id: &str, f: impl FnOnce(&MessageLog) -> T) -> Option<T> {
        let session = self.sessions.get(session_id)?;
        if self.is_expired(&session) {
            return None;
        }
        Some(f(&session.log))
    }

    fn is_expired(&self, session: &Session) -> bool {
        self.config
            .idle_ttl
            .is_some_and(|ttl| session.last_active.elapsed() > ttl)
    }

    fn enforce_session_cap(&self, keep: &str) {
        let Some(max) = self.config.max_sessions else {
            return;
        };

        let _guard = self.eviction.lock();
        while self.sessions.len() > max {
            let oldest = self
                .sessions
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().last_active)
                .map(|entry| entry.key().clone());

            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                    warn!("Session cap {} reached; evicted session {}", max, id);
                }
                None => break,
            }
        }
    }
}
