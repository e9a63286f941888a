//! # Notification Errors
//!
//! Per-channel failure values. These are captured into
//! [`ChannelAttempt`](super::ChannelAttempt) records by the dispatcher and
//! never surface as errors from `dispatch` itself.

use thiserror::Error;

/// Result type for channel send operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// A single channel's delivery failure.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// A sender or recipient address could not be parsed.
    #[error("invalid {kind} address: {detail}")]
    InvalidAddress {
        /// Which address was bad ("from" or "to")
        kind: &'static str,
        /// Parser diagnostic
        detail: String,
    },

    /// SMTP connection, authentication or protocol failure.
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    /// SMS provider HTTP request failed.
    #[error("SMS provider request failed: {0}")]
    Http(String),

    /// The dry-run log could not be written.
    #[error("dry-run log write failed: {0}")]
    DryRunLog(String),
}
