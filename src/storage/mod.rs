//! Conversation storage: the [`ConversationStore`] trait and its backends.
//!
//! ## Modules
//!
//! - [`memory`] – volatile in-process store (default / test backend)
//! - [`sled_store`] – partitioned embedded key-value store
//!
//! A conversation is an ordered sequence of [`StoredMessage`]s keyed by chat id.
//! Message identity is `(chat_id, timestamp)`; timestamps come from a per-process
//! strictly monotonic millisecond clock so that byte/insert order equals time order.

mod memory;
mod sled_store;

pub use memory::InMemoryStore;
pub use sled_store::SledStore;

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from conversation store operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Who authored a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SenderRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// One immutable conversation turn.
///
/// Serialized field names match the persisted item layout
/// (`From` / `Username` / `Content` / `Timestamp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(rename = "From")]
    pub role: SenderRole,
    #[serde(rename = "Username", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "Content")]
    pub content: String,
    /// Milliseconds since the Unix epoch, assigned at write time.
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
}

/// Per-chat conversation history backend.
///
/// Implementations must be safe to call concurrently for different chat ids.
/// Same-chat concurrent writes only promise that each individual write survives;
/// their relative order is whatever the timestamps say.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends a user-authored message.
    async fn save_message(
        &self,
        chat_id: i64,
        username: &str,
        content: &str,
    ) -> Result<(), StorageError>;

    /// Appends an assistant-authored message.
    async fn save_response(&self, chat_id: i64, content: &str) -> Result<(), StorageError>;

    /// Returns at most `limit` most-recent messages in ascending chronological
    /// order; `limit <= 0` returns the full history.
    ///
    /// Soft-failing by contract: backend errors are logged and yield an empty Vec,
    /// since conversation context is a best-effort enhancement.
    async fn get_conversation(&self, chat_id: i64, limit: i64) -> Vec<StoredMessage>;

    /// Deletes all messages for `chat_id`. Unlike reads, failures here propagate:
    /// a silently failed reset leaves stale history the caller cannot see.
    async fn reset_conversation(&self, chat_id: i64) -> Result<(), StorageError>;
}

static LAST_TIMESTAMP_MS: AtomicI64 = AtomicI64::new(0);

/// Next write timestamp: wall clock in milliseconds, bumped past the previous
/// value on collision or clock regression. Strictly increasing per process.
pub(crate) fn next_timestamp_ms() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut prev = LAST_TIMESTAMP_MS.load(Ordering::Relaxed);
    loop {
        let next = if now > prev { now } else { prev + 1 };
        match LAST_TIMESTAMP_MS.compare_exchange_weak(
            prev,
            next,
            Ordering::SeqCst,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}
