//! Error types for rate limiting operations.
//!
//! Three error kinds matter here: configuration errors raised synchronously
//! at construction, transport errors from the shared store, and script
//! (atomicity) failures. Cancellation is not an error and never appears in
//! this hierarchy.

use std::time::Duration;
use thiserror::Error;

/// Result type for rate limiting operations.
pub type Result<T> = std::result::Result<T, FreqLimitError>;

/// Main error type for rate limiting operations.
#[derive(Debug, Error)]
pub enum FreqLimitError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Connection error (e.g. Redis connection failed).
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid limit parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Invalid backend configuration.
    #[error("Invalid backend configuration: {0}")]
    InvalidBackend(String),
}

/// Storage-related errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Generic storage operation failed.
    #[error("{message}")]
    OperationFailed {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Server-side script execution failed; state is unchanged.
    #[error("Script execution failed: {0}")]
    Script(String),

    /// The store returned a value this client cannot parse.
    #[error("Malformed store reply: {0}")]
    Decode(String),

    /// Connection pool exhausted.
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl StorageError {
    /// Create a new operation failed error.
    pub fn operation_failed(message: impl Into<String>, retryable: bool) -> Self {
        Self::OperationFailed {
            message: message.into(),
            retryable,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OperationFailed { retryable, .. } => *retryable,
            Self::PoolExhausted => true,
            _ => false,
        }
    }
}

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Failed to connect.
    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    /// Connection timeout.
    #[error("Connection timeout after {0:?}")]
    Timeout(Duration),
}
