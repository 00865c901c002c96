//! Shared test doubles: canned completion clients and a recording outbound port.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mistral_gateway::{ChatTurn, CompletionClient, CompletionError, Outbound};
use teloxide::types::CallbackQuery;

/// Completion client that always answers with the same text.
pub struct StubCompletion {
    reply: String,
}

impl StubCompletion {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for StubCompletion {
    async fn get_completion(
        &self,
        _prompt: &str,
        _history: &[ChatTurn],
    ) -> Result<String, CompletionError> {
        Ok(self.reply.clone())
    }
}

/// Completion client that simulates a provider that always times out.
pub struct TimeoutCompletion;

#[async_trait]
impl CompletionClient for TimeoutCompletion {
    async fn get_completion(
        &self,
        _prompt: &str,
        _history: &[ChatTurn],
    ) -> Result<String, CompletionError> {
        Err(CompletionError::Timeout)
    }
}

/// Outbound port that records every delivery instead of talking to Telegram.
pub struct RecordingOutbound {
    pub sent: Mutex<Vec<(i64, String)>>,
    pub typing: Mutex<Vec<i64>>,
    pub acked: Mutex<usize>,
}

impl RecordingOutbound {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            typing: Mutex::new(Vec::new()),
            acked: Mutex::new(0),
        })
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn send_text(&self, chat_id: i64, text: &str) -> mistral_gateway::Result<()> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> mistral_gateway::Result<()> {
        self.typing.lock().unwrap().push(chat_id);
        Ok(())
    }

    async fn ack_callback(&self, _query: &CallbackQuery) -> mistral_gateway::Result<()> {
        *self.acked.lock().unwrap() += 1;
        Ok(())
    }
}
