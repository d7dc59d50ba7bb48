//! Schedule notifier error types.

use std::time::Duration;

use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

/// A notification did not reach the scheduler or was refused by it.
///
/// Callers only distinguish success from failure; the variants exist for
/// logs and error messages.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid scheduler url: {0}")]
    InvalidUrl(String),

    #[error("failed to encode policy: {0}")]
    Encode(String),

    #[error("failed to connect to scheduler at {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("scheduler request {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("scheduler {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("scheduler {endpoint} did not answer within {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },
}
