//! Error types for the policy store.

use thiserror::Error;

/// Result type alias for policy store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during policy store operations.
///
/// Callers treat every variant the same way: the store is unavailable or
/// refused the operation, and nothing may be assumed about partial effects
/// of the failed call beyond redb's transaction guarantees.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}
