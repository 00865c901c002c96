//! Conversation relay: the pipeline between an inbound message and its reply.
//!
//! Sequence: persist the user message → fetch bounded history → call the
//! completion provider → persist the reply → return it. Persistence failures are
//! logged and never abort the pipeline; provider failures map to per-kind
//! user-facing fallback text. `process_message` is infallible to its callers:
//! the user always gets *some* reply.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::completion::{ChatTurn, CompletionClient, CompletionError, TurnRole};
use crate::storage::{ConversationStore, SenderRole, StoredMessage};

/// How many recent messages are fed back to the provider as context.
pub const DEFAULT_HISTORY_LIMIT: i64 = 5;

pub const FALLBACK_TIMEOUT: &str =
    "Sorry, the assistant took too long to answer. Please try again in a moment.";
pub const FALLBACK_UNREACHABLE: &str =
    "Sorry, I could not reach the assistant right now. Please try again later.";
pub const FALLBACK_REJECTED: &str =
    "Sorry, the assistant service rejected the request. Please contact the operator if this persists.";
pub const FALLBACK_GENERIC: &str =
    "Sorry, something went wrong while generating a reply. Please try again later.";

/// Maps a completion failure to the reply the user sees. Every kind gets a
/// distinct string where the distinction helps diagnosis from user reports.
pub fn fallback_reply(error: &CompletionError) -> &'static str {
    match error {
        CompletionError::Timeout => FALLBACK_TIMEOUT,
        CompletionError::Connect(_) => FALLBACK_UNREACHABLE,
        CompletionError::Auth => FALLBACK_REJECTED,
        CompletionError::Api(_) | CompletionError::InvalidResponse(_) => FALLBACK_GENERIC,
    }
}

fn to_chat_turn(message: &StoredMessage) -> ChatTurn {
    ChatTurn {
        role: match message.role {
            SenderRole::User => TurnRole::User,
            SenderRole::Assistant => TurnRole::Assistant,
        },
        content: message.content.clone(),
    }
}

/// Orchestrates storage and completion for one inbound message.
pub struct ConversationRelay {
    store: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionClient>,
    history_limit: i64,
}

impl ConversationRelay {
    pub fn new(store: Arc<dyn ConversationStore>, completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            store,
            completion,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, history_limit: i64) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Runs the full pipeline and returns the reply text. Never fails: provider
    /// errors become fallback text here, and anything else degrades to a logged
    /// generic fallback rather than surfacing to the caller.
    #[instrument(skip(self, text))]
    pub async fn process_message(&self, chat_id: i64, username: &str, text: &str) -> String {
        info!(chat_id, username, "processing message");

        if let Err(e) = self.store.save_message(chat_id, username, text).await {
            error!(error = %e, chat_id, "failed to save user message, continuing without it");
        }

        let conversation = self.store.get_conversation(chat_id, self.history_limit).await;
        info!(chat_id, context_len = conversation.len(), "conversation context retrieved");

        let mut history: Vec<ChatTurn> = conversation.iter().map(to_chat_turn).collect();
        // The just-saved inbound message is passed separately as the prompt; if the
        // bounded read returned it, drop it so the turn is not submitted twice.
        if history
            .last()
            .is_some_and(|turn| turn.role == TurnRole::User && turn.content == text)
        {
            history.pop();
        }

        let reply = match self.completion.get_completion(text, &history).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(error = %e, chat_id, "completion failed, replying with fallback");
                fallback_reply(&e).to_string()
            }
        };

        if let Err(e) = self.store.save_response(chat_id, &reply).await {
            error!(error = %e, chat_id, "failed to save reply");
        }

        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::MockCompletionClient;
    use crate::storage::{InMemoryStore, StorageError};

    /// Store whose writes fail and whose reads yield nothing, as a broken
    /// backend would per the soft-fail read contract.
    struct FailingStore;

    #[async_trait::async_trait]
    impl ConversationStore for FailingStore {
        async fn save_message(&self, _: i64, _: &str, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("write failed".to_string()))
        }

        async fn save_response(&self, _: i64, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("write failed".to_string()))
        }

        async fn get_conversation(&self, _: i64, _: i64) -> Vec<StoredMessage> {
            Vec::new()
        }

        async fn reset_conversation(&self, _: i64) -> Result<(), StorageError> {
            Err(StorageError::Backend("delete failed".to_string()))
        }
    }

    fn relay_with(
        store: Arc<dyn ConversationStore>,
        completion: MockCompletionClient,
    ) -> ConversationRelay {
        ConversationRelay::new(store, Arc::new(completion))
    }

    #[tokio::test]
    async fn test_round_trip_stores_both_turns() {
        let store = Arc::new(InMemoryStore::new());
        let mut completion = MockCompletionClient::new();
        completion
            .expect_get_completion()
            .withf(|prompt, history| prompt == "Hi" && history.is_empty())
            .returning(|_, _| Ok("Hello Bob!".to_string()));

        let reply = relay_with(store.clone(), completion)
            .process_message(42, "bob", "Hi")
            .await;

        assert_eq!(reply, "Hello Bob!");
        let messages = store.get_conversation(42, 10).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, SenderRole::User);
        assert_eq!(messages[0].content, "Hi");
        assert_eq!(messages[0].username.as_deref(), Some("bob"));
        assert_eq!(messages[1].role, SenderRole::Assistant);
        assert_eq!(messages[1].content, "Hello Bob!");
    }

    #[tokio::test]
    async fn test_timeout_fallback_is_returned_and_stored() {
        let store = Arc::new(InMemoryStore::new());
        let mut completion = MockCompletionClient::new();
        completion
            .expect_get_completion()
            .returning(|_, _| Err(CompletionError::Timeout));

        let reply = relay_with(store.clone(), completion)
            .process_message(1, "alice", "anyone there?")
            .await;

        assert_eq!(reply, FALLBACK_TIMEOUT);
        let messages = store.get_conversation(1, 10).await;
        assert_eq!(messages[1].role, SenderRole::Assistant);
        assert_eq!(messages[1].content, FALLBACK_TIMEOUT);
    }

    #[tokio::test]
    async fn test_history_excludes_the_active_prompt() {
        let store = Arc::new(InMemoryStore::new());
        store.save_message(9, "alice", "earlier question").await.unwrap();
        store.save_response(9, "earlier answer").await.unwrap();

        let mut completion = MockCompletionClient::new();
        completion
            .expect_get_completion()
            .withf(|prompt, history| {
                prompt == "new question"
                    && history.len() == 2
                    && history[0].content == "earlier question"
                    && history[1].content == "earlier answer"
            })
            .returning(|_, _| Ok("answer".to_string()));

        let reply = relay_with(store, completion)
            .process_message(9, "alice", "new question")
            .await;

        assert_eq!(reply, "answer");
    }

    #[tokio::test]
    async fn test_history_is_bounded_by_the_limit() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..8 {
            store.save_message(3, "bob", &format!("m{}", i)).await.unwrap();
        }

        let mut completion = MockCompletionClient::new();
        // The bounded read returns 5 turns including the just-saved prompt,
        // which is then excluded from history.
        completion
            .expect_get_completion()
            .withf(|_, history| history.len() == 4)
            .returning(|_, _| Ok("ok".to_string()));

        relay_with(store, completion)
            .process_message(3, "bob", "latest")
            .await;
    }

    #[tokio::test]
    async fn test_broken_store_still_yields_a_reply() {
        let mut completion = MockCompletionClient::new();
        completion
            .expect_get_completion()
            .withf(|prompt, history| prompt == "hello" && history.is_empty())
            .returning(|_, _| Ok("live completion".to_string()));

        let reply = relay_with(Arc::new(FailingStore), completion)
            .process_message(5, "carol", "hello")
            .await;

        assert_eq!(reply, "live completion");
    }

    #[tokio::test]
    async fn test_broken_store_and_provider_still_yield_a_reply() {
        let mut completion = MockCompletionClient::new();
        completion
            .expect_get_completion()
            .returning(|_, _| Err(CompletionError::Connect("refused".to_string())));

        let reply = relay_with(Arc::new(FailingStore), completion)
            .process_message(5, "carol", "hello")
            .await;

        assert_eq!(reply, FALLBACK_UNREACHABLE);
        assert!(!reply.is_empty());
    }

    #[test]
    fn test_fallback_kinds_are_distinguishable() {
        let replies = [
            fallback_reply(&CompletionError::Timeout),
            fallback_reply(&CompletionError::Connect("refused".to_string())),
            fallback_reply(&CompletionError::Auth),
            fallback_reply(&CompletionError::Api(500)),
        ];
        assert_eq!(replies[0], FALLBACK_TIMEOUT);
        assert_eq!(replies[1], FALLBACK_UNREACHABLE);
        assert_eq!(replies[2], FALLBACK_REJECTED);
        assert_eq!(replies[3], FALLBACK_GENERIC);
        // Timeout, connection, and auth must not collapse into one string.
        assert_ne!(replies[0], replies[1]);
        assert_ne!(replies[1], replies[2]);
        assert_ne!(replies[0], replies[2]);
    }
}
