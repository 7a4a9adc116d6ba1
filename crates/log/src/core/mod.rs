//! Core types shared by every part of the logging system.
//!
//! ### [`error`] - Error handling
//! [`LogError`] for logger construction and calls, [`InitError`] for
//! error-report client creation and [`ReportError`] for failed submissions.

pub mod error;

pub use error::{InitError, LogError, LogResult, ReportError};
