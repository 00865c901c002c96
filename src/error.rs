//! Error types for the gateway.
//!
//! [`GatewayError`] is the top-level error for transport and wiring failures.
//! Storage and completion carry their own error types ([`crate::storage::StorageError`],
//! [`crate::completion::CompletionError`]); they are converted here only when they
//! must cross a component boundary.

use thiserror::Error;

use crate::storage::StorageError;

/// Top-level error for the gateway (storage, Telegram transport, config, IO).
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gateway operations; uses [`GatewayError`].
pub type Result<T> = std::result::Result<T, GatewayError>;
