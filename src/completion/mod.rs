//! Completion provider abstraction and the Mistral AI implementation.
//!
//! The client returns a typed [`CompletionError`] instead of a user-facing apology
//! string; mapping failure kinds to fallback text is the relay's job.

mod mistral;

pub use mistral::{MistralClient, DEFAULT_MISTRAL_BASE_URL, DEFAULT_MISTRAL_MODEL};

use async_trait::async_trait;
use thiserror::Error;

/// Role of one conversation turn, in the provider's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One prior conversation turn sent to the provider as context.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

/// How a completion request failed. Each kind maps to a distinct user-facing
/// fallback so operators can tell causes apart from user reports.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Authentication rejected by provider")]
    Auth,

    #[error("Provider returned HTTP {0}")]
    Api(u16),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Text-completion provider: prompt plus prior turns in, generated text out.
/// One request per call; no caching, no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn get_completion(
        &self,
        prompt: &str,
        history: &[ChatTurn],
    ) -> Result<String, CompletionError>;
}
