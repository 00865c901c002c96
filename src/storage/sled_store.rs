//! Partitioned embedded key-value implementation of the ConversationStore trait.
//!
//! Each message is one record under the composite key
//! `CHAT#{chat_id}#MSG#{timestamp_ms}` with the timestamp zero-padded so that byte
//! order equals chronological order. Reads scan the partition prefix (descending
//! when only the most recent `limit` are wanted, then reversed); reset removes the
//! whole partition in a single atomic batch.

use super::{next_timestamp_ms, ConversationStore, SenderRole, StorageError, StoredMessage};
use std::path::Path;
use tracing::{error, info};

/// Conversation store on a local sled database. Survives restarts.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens (or creates) the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(Self { db })
    }

    /// Key prefix covering every record of one chat. The trailing `#` keeps
    /// chat 1 from matching chat 12.
    fn partition_prefix(chat_id: i64) -> String {
        format!("CHAT#{}#", chat_id)
    }

    fn message_key(chat_id: i64, timestamp: i64) -> String {
        format!("CHAT#{}#MSG#{:020}", chat_id, timestamp)
    }

    async fn append(&self, chat_id: i64, message: &StoredMessage) -> Result<(), StorageError> {
        let key = Self::message_key(chat_id, message.timestamp);
        let value = serde_json::to_vec(message)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.db
            .insert(key.as_bytes(), value)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        self.db
            .flush_async()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    fn decode(value: &[u8]) -> Result<StoredMessage, StorageError> {
        serde_json::from_slice(value).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ConversationStore for SledStore {
    async fn save_message(
        &self,
        chat_id: i64,
        username: &str,
        content: &str,
    ) -> Result<(), StorageError> {
        let message = StoredMessage {
            role: SenderRole::User,
            username: Some(username.to_string()),
            content: content.to_string(),
            timestamp: next_timestamp_ms(),
        };
        self.append(chat_id, &message).await
    }

    async fn save_response(&self, chat_id: i64, content: &str) -> Result<(), StorageError> {
        let message = StoredMessage {
            role: SenderRole::Assistant,
            username: None,
            content: content.to_string(),
            timestamp: next_timestamp_ms(),
        };
        self.append(chat_id, &message).await
    }

    async fn get_conversation(&self, chat_id: i64, limit: i64) -> Vec<StoredMessage> {
        let prefix = Self::partition_prefix(chat_id);
        let mut messages = Vec::new();

        if limit > 0 {
            // Newest first, then reverse back to chronological order.
            for item in self.db.scan_prefix(prefix.as_bytes()).rev().take(limit as usize) {
                match item.map_err(|e| StorageError::Backend(e.to_string())) {
                    Ok((_, value)) => match Self::decode(&value) {
                        Ok(message) => messages.push(message),
                        Err(e) => {
                            error!(error = %e, chat_id, "failed to decode stored message, returning empty history");
                            return Vec::new();
                        }
                    },
                    Err(e) => {
                        error!(error = %e, chat_id, "failed to read conversation, returning empty history");
                        return Vec::new();
                    }
                }
            }
            messages.reverse();
        } else {
            for item in self.db.scan_prefix(prefix.as_bytes()) {
                match item.map_err(|e| StorageError::Backend(e.to_string())) {
                    Ok((_, value)) => match Self::decode(&value) {
                        Ok(message) => messages.push(message),
                        Err(e) => {
                            error!(error = %e, chat_id, "failed to decode stored message, returning empty history");
                            return Vec::new();
                        }
                    },
                    Err(e) => {
                        error!(error = %e, chat_id, "failed to read conversation, returning empty history");
                        return Vec::new();
                    }
                }
            }
        }

        messages
    }

    async fn reset_conversation(&self, chat_id: i64) -> Result<(), StorageError> {
        let prefix = Self::partition_prefix(chat_id);
        let mut batch = sled::Batch::default();
        let mut deleted = 0usize;

        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item.map_err(|e| {
                error!(error = %e, chat_id, "failed to enumerate conversation for reset");
                StorageError::Backend(e.to_string())
            })?;
            batch.remove(key);
            deleted += 1;
        }

        self.db.apply_batch(batch).map_err(|e| {
            error!(error = %e, chat_id, "failed to delete conversation batch");
            StorageError::Backend(e.to_string())
        })?;
        self.db
            .flush_async()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        info!(chat_id, deleted, "conversation reset");
        Ok(())
    }
}
