//! Error types for the fib worker.

use crate::health::HealthPhase;

/// Top-level error type for the worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures while establishing the command or subscriber connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {target}: {reason}")]
    Connect { target: String, reason: String },

    #[error("Failed to subscribe to channel {channel}: {reason}")]
    Subscribe { channel: String, reason: String },

    #[error("Backend unreachable: {0}")]
    Unreachable(String),
}

/// Persistence failures after a successful computation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Failed to read {key}: {reason}")]
    Read { key: String, reason: String },
}

/// A subscription payload that could not be turned into an index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("Payload is not a number: {payload:?}")]
    NotANumber { payload: String },
}

/// Outcome of handling a single message that did not end in a stored value.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Parse(#[from] MessageError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rejected health phase change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot transition health from {from} to {to}")]
pub struct TransitionError {
    pub from: HealthPhase,
    pub to: HealthPhase,
}

/// Result type alias for the worker.
pub type Result<T> = std::result::Result<T, Error>;
