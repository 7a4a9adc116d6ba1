//! Error types for una-log
//!
//! Three families, matching the three places things can go wrong:
//! - [`LogError`]: building or calling a logger
//! - [`InitError`]: creating the error-report client
//! - [`ReportError`]: submitting a report to the remote backend

use std::path::PathBuf;
use std::time::Duration;

/// Result type for logger operations
pub type LogResult<T> = Result<T, LogError>;

/// Errors raised by loggers and their configuration
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Malformed key/value list passed to a logging call
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// What was wrong with the list
        reason: String,
    },

    /// Output could not be redirected to the requested file
    #[error("Failed to redirect output to '{}': {source}", path.display())]
    FileRedirect {
        /// Requested file
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LogError {
    pub(crate) fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            reason: reason.into(),
        }
    }
}

/// Error-report client could not be created
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The backend rejected the supplied identity
    #[error("Invalid reporting identity: {reason}")]
    InvalidIdentity {
        /// Why the identity was rejected
        reason: String,
    },

    /// The backend could not be reached while constructing the client
    #[error("Error reporting endpoint unreachable: {reason}")]
    Unreachable {
        /// Transport level description
        reason: String,
    },

    /// No connector is available to build a client
    #[error("No error reporting backend configured")]
    NoBackend,
}

/// A report could not be delivered
///
/// Never escalated: callers log it locally and move on.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The backend did not confirm delivery before the deadline
    #[error("Report not delivered within {0:?}")]
    Timeout(Duration),

    /// The backend refused the report
    #[error("Report rejected: {0}")]
    Rejected(String),

    /// The client was already closed
    #[error("Error reporting client is closed")]
    Closed,
}
