//! Record schema: structural field names and severity labels
//!
//! Every sink owned by a [`Logging`](crate::Logging) formats records through
//! one shared [`Schema`]. It starts out with plain names and is remapped once,
//! when the first logger is created, by the configured [`Defaults`].

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::severity::Severity;

/// Field names and severity labels used when rendering a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Field holding the severity label
    pub level_key: String,
    /// Field holding the message
    pub message_key: String,
    /// Field holding the RFC 3339 timestamp
    pub time_key: String,
    /// Field holding the logger name
    pub name_key: String,
    /// Field holding the display form of an attached error
    pub error_key: String,
    /// Field holding the string labels of error and fatal records
    pub labels_key: String,
    labels: [String; 4],
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            level_key: "level".to_string(),
            message_key: "msg".to_string(),
            time_key: "time".to_string(),
            name_key: "name".to_string(),
            error_key: "error".to_string(),
            labels_key: "labels".to_string(),
            labels: Severity::ALL.map(|s| s.as_str().to_string()),
        }
    }
}

impl Schema {
    /// Label written for `severity`
    pub fn label(&self, severity: Severity) -> &str {
        &self.labels[severity as usize]
    }

    /// Replace the label written for `severity`
    pub fn set_label(&mut self, severity: Severity, label: impl Into<String>) {
        self.labels[severity as usize] = label.into();
    }
}

/// One-time remapping applied to the shared schema
///
/// Runs under the registry lock, exactly once per [`Logging`](crate::Logging),
/// however many loggers are created concurrently.
pub trait Defaults: Send + Sync {
    /// Rewrite `schema` in place
    fn apply(&self, schema: &mut Schema);
}

/// Remapping compatible with the Google Cloud Logging `LogEntry` format
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudLoggingDefaults;

impl Defaults for CloudLoggingDefaults {
    fn apply(&self, schema: &mut Schema) {
        schema.level_key = "severity".to_string();
        schema.message_key = "message".to_string();
        schema.time_key = "timestamp".to_string();
        schema.set_label(Severity::Debug, "DEBUG");
        schema.set_label(Severity::Info, "INFO");
        schema.set_label(Severity::Error, "ERROR");
        schema.set_label(Severity::Fatal, "CRITICAL");
    }
}

/// Schema handle shared between a `Logging` and its sinks
pub type SharedSchema = Arc<ArcSwap<Schema>>;

/// Wrap `schema` for sharing with sinks
pub fn shared(schema: Schema) -> SharedSchema {
    Arc::new(ArcSwap::from_pointee(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_labels_are_lowercase() {
        let schema = Schema::default();
        assert_eq!(schema.label(Severity::Debug), "debug");
        assert_eq!(schema.label(Severity::Fatal), "fatal");
        assert_eq!(schema.level_key, "level");
    }

    #[test]
    fn test_cloud_logging_remap() {
        let mut schema = Schema::default();
        CloudLoggingDefaults.apply(&mut schema);

        assert_eq!(schema.level_key, "severity");
        assert_eq!(schema.message_key, "message");
        assert_eq!(schema.time_key, "timestamp");
        assert_eq!(
            Severity::ALL.map(|s| schema.label(s).to_string()),
            ["DEBUG", "INFO", "ERROR", "CRITICAL"].map(String::from)
        );
        // reserved attachment fields are not renamed
        assert_eq!(schema.error_key, "error");
        assert_eq!(schema.labels_key, "labels");
    }
}
