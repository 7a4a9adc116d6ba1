//! Structured log sinks
//!
//! A [`Sink`] is the leveled writer a [`Logger`](crate::Logger) delegates to.
//! The facade only relies on the capability set of this trait:
//! - [`JsonSink`]: one JSON object per line on an `io::Write`
//! - [`TracingSink`]: forwards records into the host's `tracing` dispatcher

mod bridge;
mod json;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use bridge::TracingSink;
pub use json::JsonSink;

use crate::severity::Severity;
use crate::writer::BoxWriter;

/// Ephemeral record handed to a sink, built per logging call
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    /// Record severity
    pub severity: Severity,
    /// Human readable message
    pub message: &'a str,
    /// Top-level key/value pairs, in call order
    pub fields: Vec<(&'a str, &'a Value)>,
    /// Display form of the attached error
    pub error: Option<String>,
    /// String labels attached to error and fatal records
    pub labels: Option<BTreeMap<String, String>>,
}

impl<'a> Record<'a> {
    /// Record with a message and nothing attached
    pub fn new(severity: Severity, message: &'a str) -> Self {
        Self {
            severity,
            message,
            fields: Vec::new(),
            error: None,
            labels: None,
        }
    }

    /// Attach top-level key/value pairs
    pub fn with_fields(mut self, fields: Vec<(&'a str, &'a Value)>) -> Self {
        self.fields = fields;
        self
    }

    /// Attach an error under the reserved error field
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach labels; an empty mapping is left out of the record
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = (!labels.is_empty()).then_some(labels);
        self
    }
}

/// What a sink does after emitting a fatal record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FatalAction {
    /// Flush and exit the process with `code`
    Exit {
        /// Process exit status
        code: i32,
    },
    /// Flush and panic the calling thread
    Panic,
}

impl Default for FatalAction {
    fn default() -> Self {
        Self::Exit { code: 1 }
    }
}

/// Leveled structured writer
pub trait Sink: Send + Sync + 'static {
    /// Emit `record` if its severity passes the threshold
    fn write(&self, record: &Record<'_>);

    /// Whether records of `severity` are currently emitted
    fn is_enabled(&self, severity: Severity) -> bool;

    /// Change the severity threshold
    fn set_level(&self, level: Severity);

    /// Current severity threshold
    fn level(&self) -> Severity;

    /// Redirect output to `writer`
    fn bind_writer(&self, writer: BoxWriter);

    /// Flush buffered output
    fn flush(&self) {}

    /// Fatal path, called after a fatal record was emitted
    fn terminate(&self) -> ! {
        self.flush();
        std::process::exit(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_labels_are_dropped() {
        let record = Record::new(Severity::Error, "boom").with_labels(BTreeMap::new());
        assert!(record.labels.is_none());
    }

    #[test]
    fn test_fatal_action_serde() {
        let exit: FatalAction = serde_json::from_str(r#"{"action":"exit","code":3}"#).unwrap();
        assert_eq!(exit, FatalAction::Exit { code: 3 });

        let panic: FatalAction = serde_json::from_str(r#"{"action":"panic"}"#).unwrap();
        assert_eq!(panic, FatalAction::Panic);
        assert_eq!(FatalAction::default(), FatalAction::Exit { code: 1 });
    }
}
