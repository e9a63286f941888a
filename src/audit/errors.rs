//! # Audit Errors

use std::io;

use thiserror::Error;

/// Result type for audit store operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors raised by the audit store.
///
/// The pipeline downgrades these to outcome warnings; callers that talk to
/// the store directly (the CLI) propagate them.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Filesystem operation failed.
    #[error("audit I/O failed while {context}")]
    Io {
        /// What the store was doing
        context: &'static str,
        /// Underlying cause
        #[source]
        source: io::Error,
    },

    /// Record (de)serialization failed.
    #[error("audit serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Stored data could not be interpreted.
    #[error("corrupt audit data at line {line}: {detail}")]
    Corrupt {
        /// 1-based line number in the record log
        line: usize,
        /// What was wrong
        detail: String,
    },
}

impl AuditError {
    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        AuditError::Io { context, source }
    }
}
