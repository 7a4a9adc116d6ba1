//! # Una Log - Structured JSON Logging with Error Reporting
//!
//! One JSON object per line, in a schema Cloud Logging understands, plus a
//! remote error-report client for errors and panics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use una_log::prelude::*;
//!
//! let logging = Logging::new();
//! let log = logging.new_logger(Config::from_env("api"));
//!
//! log.info("server starting", &fields!["port" => 8080]).unwrap();
//!
//! // Errors and panics go to the error-report client once it exists
//! logging.init_error_reporting(Identity::from_env()).unwrap();
//! let answer = logging.catch_and_report(ReportContext::new(), || 42);
//! assert_eq!(answer, 42);
//! ```
//!
//! ## Output
//!
//! With the default Cloud Logging remapping a record looks like
//!
//! ```text
//! {"timestamp":"2026-01-02T03:04:05Z","severity":"ERROR","name":"api","message":"lookup failed","error":"not found","labels":{"user":"ada"}}
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod args;
mod config;
mod core;
mod logger;
mod logging;
mod macros;
mod panic;
mod registry;
mod report;
mod schema;
mod severity;
mod sink;
mod writer;

pub mod global;

// Public API
pub use config::Config;
pub use crate::core::{InitError, LogError, LogResult, ReportError};
pub use args::{display as display_value, labels as parse_labels, pairs as parse_pairs};
pub use logger::Logger;
pub use logging::{Logging, LoggingBuilder};
pub use panic::{GuardState, NON_STRING_PAYLOAD, PanicReportGuard, REPANIC_PREFIX, payload_message};
pub use report::{
    Connector, ContextGuard, DEFAULT_FLUSH_TIMEOUT, EntryKind, ErrorEntry, ErrorReporter, Identity,
    ReportBackend, ReportContext,
};
#[cfg(feature = "sentry")]
pub use report::sentry::{SentryBackend, SentryConnector};
pub use schema::{CloudLoggingDefaults, Defaults, Schema, SharedSchema, shared as shared_schema};
pub use severity::Severity;
pub use sink::{FatalAction, JsonSink, Record, Sink, TracingSink};
pub use writer::{BoxWriter, SharedBuffer, Target};

#[doc(hidden)]
pub use serde_json;

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Config, Identity, LogError, LogResult, Logger, Logging, ReportContext, Severity, fields,
        report_panics,
    };
}
