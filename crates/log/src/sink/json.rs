//! JSON line sink

use std::io::Write;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{FatalAction, Record, Sink};
use crate::schema::SharedSchema;
use crate::severity::{LevelCell, Severity};
use crate::writer::BoxWriter;

/// Sink rendering each record as one JSON object per line
///
/// Structural field names and severity labels come from the shared
/// [`Schema`](crate::Schema), so a remap is picked up by every sink at once.
pub struct JsonSink {
    name: String,
    level: LevelCell,
    writer: Mutex<BoxWriter>,
    schema: SharedSchema,
    on_fatal: FatalAction,
}

impl std::fmt::Debug for JsonSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSink")
            .field("name", &self.name)
            .field("level", &self.level.get())
            .field("on_fatal", &self.on_fatal)
            .finish_non_exhaustive()
    }
}

impl JsonSink {
    /// Create a sink named `name` writing to `writer`, at info level
    pub fn new(name: impl Into<String>, writer: BoxWriter, schema: SharedSchema) -> Self {
        Self {
            name: name.into(),
            level: LevelCell::new(Severity::Info),
            writer: Mutex::new(writer),
            schema,
            on_fatal: FatalAction::default(),
        }
    }

    /// Set the initial severity threshold
    pub fn with_level(self, level: Severity) -> Self {
        self.level.set(level);
        self
    }

    /// Set what happens after a fatal record
    pub fn with_fatal_action(mut self, action: FatalAction) -> Self {
        self.on_fatal = action;
        self
    }

    /// Sink name, written under the schema's name field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render `record` as a single JSON object, without trailing newline
    pub fn render(&self, record: &Record<'_>) -> String {
        let schema = self.schema.load();
        let mut object = Map::new();

        object.insert(schema.time_key.clone(), Value::String(timestamp()));
        object.insert(
            schema.level_key.clone(),
            Value::String(schema.label(record.severity).to_string()),
        );
        object.insert(schema.name_key.clone(), Value::String(self.name.clone()));
        object.insert(
            schema.message_key.clone(),
            Value::String(record.message.to_string()),
        );

        // structural fields win over caller supplied keys
        for (key, value) in &record.fields {
            object
                .entry((*key).to_string())
                .or_insert_with(|| (*value).clone());
        }

        if let Some(error) = &record.error {
            object.insert(schema.error_key.clone(), Value::String(error.clone()));
        }
        if let Some(labels) = &record.labels {
            let labels = labels
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            object.insert(schema.labels_key.clone(), Value::Object(labels));
        }

        Value::Object(object).to_string()
    }
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

impl Sink for JsonSink {
    fn write(&self, record: &Record<'_>) {
        if !self.is_enabled(record.severity) {
            return;
        }

        let mut line = self.render(record);
        line.push('\n');

        let mut writer = self.writer.lock();
        if let Err(e) = writer.write_all(line.as_bytes()) {
            tracing::warn!(logger = %self.name, error = %e, "failed to write log record");
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

    fn bind_writer(&self, writer: BoxWriter) {
        let mut current = self.writer.lock();
        if let Err(e) = current.flush() {
            tracing::warn!(logger = %self.name, error = %e, "failed to flush replaced writer");
        }
        *current = writer;
    }

    fn flush(&self) {
        if let Err(e) = self.writer.lock().flush() {
            tracing::warn!(logger = %self.name, error = %e, "failed to flush log output");
        }
    }

    fn terminate(&self) -> ! {
        self.flush();
        match self.on_fatal {
            FatalAction::Exit { code } => std::process::exit(code),
            FatalAction::Panic => panic!("fatal record emitted by logger '{}'", self.name),
        }
    }
}
