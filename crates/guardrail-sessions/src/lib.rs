//! Guardrail Sessions
//!
//! Keeps a bounded message history per conversation session and evaluates
//! safety over a whole session by running the joined history through a
//! shared [`guardrail_safety::GuardrailsEngine`].

pub mod error;
pub mod history;
pub mod models;
pub mod store;

pub use error::{SessionError, SessionResult};
pub use history::{MessageLog, DEFAULT_MAX_HISTORY, DEFAULT_WINDOW};
pub use models::{Message, SessionStats};
pub use store::{ConversationStore, StoreConfig};
