//! In-memory implementation of the ConversationStore trait.

use super::{next_timestamp_ms, ConversationStore, SenderRole, StorageError, StoredMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

type ConversationMap = HashMap<i64, Vec<StoredMessage>>;

/// Volatile conversation store for development and tests.
/// Nothing survives a restart.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    conversations: Arc<RwLock<ConversationMap>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(RwLock::new(ConversationMap::new())),
        }
    }

    async fn append(&self, chat_id: i64, message: StoredMessage) {
        let mut conversations = self.conversations.write().await;
        conversations.entry(chat_id).or_default().push(message);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryStore {
    async fn save_message(
        &self,
        chat_id: i64,
        username: &str,
        content: &str,
    ) -> Result<(), StorageError> {
        self.append(
            chat_id,
            StoredMessage {
                role: SenderRole::User,
                username: Some(username.to_string()),
                content: content.to_string(),
                timestamp: next_timestamp_ms(),
            },
        )
        .await;
        Ok(())
    }

    async fn save_response(&self, chat_id: i64, content: &str) -> Result<(), StorageError> {
        self.append(
            chat_id,
            StoredMessage {
                role: SenderRole::Assistant,
                username: None,
                content: content.to_string(),
                timestamp: next_timestamp_ms(),
            },
        )
        .await;
        Ok(())
    }

    async fn get_conversation(&self, chat_id: i64, limit: i64) -> Vec<StoredMessage> {
        let conversations = self.conversations.read().await;
        let messages = match conversations.get(&chat_id) {
            Some(messages) => messages,
            None => return Vec::new(),
        };
        if limit > 0 {
            let skip = messages.len().saturating_sub(limit as usize);
            messages[skip..].to_vec()
        } else {
            messages.clone()
        }
    }

    async fn reset_conversation(&self, chat_id: i64) -> Result<(), StorageError> {
        let mut conversations = self.conversations.write().await;
        conversations.remove(&chat_id);
        info!(chat_id, "conversation reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_returned_in_chronological_order() {
        let store = InMemoryStore::new();
        store.save_message(1, "alice", "first").await.unwrap();
        store.save_response(1, "second").await.unwrap();
        store.save_message(1, "alice", "third").await.unwrap();

        let messages = store.get_conversation(1, 10).await;

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
        assert_eq!(messages[2].content, "third");
        assert!(messages[0].timestamp < messages[1].timestamp);
        assert!(messages[1].timestamp < messages[2].timestamp);
    }

    #[tokio::test]
    async fn test_limit_returns_most_recent_suffix() {
        let store = InMemoryStore::new();
        for i in 1..=10 {
            store
                .save_message(99, "bob", &format!("M{}", i))
                .await
                .unwrap();
        }

        let messages = store.get_conversation(99, 3).await;

        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["M8", "M9", "M10"]);
    }

    #[tokio::test]
    async fn test_limit_zero_returns_full_history() {
        let store = InMemoryStore::new();
        for i in 0..7 {
            store
                .save_message(5, "carol", &format!("msg {}", i))
                .await
                .unwrap();
        }

        assert_eq!(store.get_conversation(5, 0).await.len(), 7);
        assert_eq!(store.get_conversation(5, -1).await.len(), 7);
    }

    #[tokio::test]
    async fn test_roles_and_username_recorded() {
        let store = InMemoryStore::new();
        store.save_message(2, "alice", "question").await.unwrap();
        store.save_response(2, "answer").await.unwrap();

        let messages = store.get_conversation(2, 0).await;

        assert_eq!(messages[0].role, SenderRole::User);
        assert_eq!(messages[0].username.as_deref(), Some("alice"));
        assert_eq!(messages[1].role, SenderRole::Assistant);
        assert!(messages[1].username.is_none());
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.save_message(7, "dave", &format!("m{}", i)).await.unwrap();
        }

        store.reset_conversation(7).await.unwrap();
        assert!(store.get_conversation(7, 0).await.is_empty());

        store.reset_conversation(7).await.unwrap();
        assert!(store.get_conversation(7, 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_chat_returns_empty() {
        let store = InMemoryStore::new();
        assert!(store.get_conversation(12345, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_chats_are_isolated() {
        let store = InMemoryStore::new();
        store.save_message(1, "alice", "for one").await.unwrap();
        store.save_message(2, "bob", "for two").await.unwrap();

        store.reset_conversation(1).await.unwrap();

        assert!(store.get_conversation(1, 0).await.is_empty());
        assert_eq!(store.get_conversation(2, 0).await.len(), 1);
    }
}
