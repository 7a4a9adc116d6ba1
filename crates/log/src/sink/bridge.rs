//! Sink forwarding records into `tracing`

use serde_json::{Map, Value};

use super::{Record, Sink};
use crate::severity::{LevelCell, Severity};
use crate::writer::BoxWriter;

/// Sink that re-emits records as `tracing` events
///
/// Output goes wherever the host's subscriber sends it. Key/value pairs are
/// rendered as one JSON `fields` value since `tracing` field names are static.
#[derive(Debug)]
pub struct TracingSink {
    name: String,
    level: LevelCell,
}

impl TracingSink {
    /// Create a bridge sink named `name`, at info level
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: LevelCell::new(Severity::Info),
        }
    }

    /// Set the initial severity threshold
    pub fn with_level(self, level: Severity) -> Self {
        self.level.set(level);
        self
    }
}

impl Sink for TracingSink {
    fn write(&self, record: &Record<'_>) {
        if !self.is_enabled(record.severity) {
            return;
        }

        let fields: Map<String, Value> = record
            .fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).clone()))
            .collect();
        let fields = Value::Object(fields);
        let error = record.error.as_deref().unwrap_or_default();
        let labels = record.labels.clone().unwrap_or_default();
        let name = self.name.as_str();
        let message = record.message;

        macro_rules! emit {
            ($macro:ident $(, $extra:ident = $val:expr)?) => {
                tracing::$macro!(
                    logger = name,
                    fields = %fields,
                    error,
                    labels = ?labels,
                    $($extra = $val,)?
                    "{message}"
                )
            };
        }

        match record.severity {
            Severity::Debug => emit!(debug),
            Severity::Info => emit!(info),
            Severity::Error => emit!(error),
            Severity::Fatal => emit!(error, fatal = true),
        }
    }

    fn is_enabled(&self, severity: Severity) -> bool {
        self.level.allows(severity)
    }

    fn set_level(&self, level: Severity) {
        self.level.set(level);
    }

    fn level(&self) -> Severity {
        self.level.get()
    }

    fn bind_writer(&self, _writer: BoxWriter) {
        tracing::debug!(
            logger = %self.name,
            "tracing sink ignores bind_writer; output is owned by the subscriber"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::SharedBuffer;
    use std::collections::BTreeMap;

    #[test]
    fn test_records_reach_subscriber() {
        let buffer = SharedBuffer::new();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        let sink = TracingSink::new("bridge");
        let labels: BTreeMap<String, String> =
            [("one".to_string(), "1".to_string())].into_iter().collect();

        tracing::subscriber::with_default(subscriber, || {
            sink.write(&Record::new(Severity::Debug, "filtered out"));
            sink.write(
                &Record::new(Severity::Error, "bridged failure")
                    .with_error("boom")
                    .with_labels(labels),
            );
        });

        let output = buffer.contents_string();
        assert!(!output.contains("filtered out"));
        assert!(output.contains("bridged failure"));
        assert!(output.contains("logger=\"bridge\""));
        assert!(output.contains("error=\"boom\""));
    }

    #[test]
    fn test_level_changes() {
        let sink = TracingSink::new("bridge").with_level(Severity::Error);
        assert!(!sink.is_enabled(Severity::Info));
        sink.set_level(Severity::Debug);
        assert_eq!(sink.level(), Severity::Debug);
    }
}
