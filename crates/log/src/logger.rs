//! Facade logger

use std::collections::BTreeMap;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use serde_json::Value;

use crate::core::{LogError, LogResult};
use crate::args;
use crate::report::{ClientSlot, ErrorEntry, ReportContext};
use crate::severity::Severity;
use crate::sink::{Record, Sink};

/// Per-component logger
///
/// Cheap to clone; clones share the sink. Created through
/// [`Logging::new_logger`](crate::Logging::new_logger) and registered there,
/// so [`Logging::set_global_level`](crate::Logging::set_global_level) reaches it.
///
/// Key/value arguments are flat `key, value, ...` slices, see [`fields!`](crate::fields).
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    sink: Arc<dyn Sink>,
    client: ClientSlot,
    redirect_failure: Option<LogError>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("level", &self.inner.sink.level())
            .finish_non_exhaustive()
    }
}

impl Logger {
    pub(crate) fn new(
        name: String,
        sink: Arc<dyn Sink>,
        client: ClientSlot,
        redirect_failure: Option<LogError>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                sink,
                client,
                redirect_failure,
            }),
        }
    }

    /// Logger name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The raw sink, for direct level queries and advanced configuration
    pub fn underlying(&self) -> &Arc<dyn Sink> {
        &self.inner.sink
    }

    /// Why the configured file redirect failed, if it did
    ///
    /// The logger then writes to its default target instead.
    pub fn redirect_failure(&self) -> Option<&LogError> {
        self.inner.redirect_failure.as_ref()
    }

    /// Redirect output to `writer`; meant to be called before first use
    pub fn set_writer(&self, writer: impl Write + Send + 'static) {
        self.inner.sink.bind_writer(Box::new(writer));
    }

    /// Whether debug records are emitted
    pub fn is_debug(&self) -> bool {
        self.inner.sink.is_enabled(Severity::Debug)
    }

    /// Log at debug severity, only when debug is enabled
    pub fn debug(&self, msg: &str, args: &[Value]) -> LogResult<()> {
        let pairs = args::pairs(args)?;
        if self.is_debug() {
            self.inner
                .sink
                .write(&Record::new(Severity::Debug, msg).with_fields(pairs));
        }
        Ok(())
    }

    /// Log at info severity
    pub fn info(&self, msg: &str, args: &[Value]) -> LogResult<()> {
        let pairs = args::pairs(args)?;
        self.inner
            .sink
            .write(&Record::new(Severity::Info, msg).with_fields(pairs));
        Ok(())
    }

    /// Log `err` at error severity and report it
    ///
    /// `args` become the record's `labels`, values in display form. The
    /// error is then handed to the error-report client, if one is configured,
    /// without waiting for delivery.
    pub fn error(&self, msg: &str, err: &dyn Error, args: &[Value]) -> LogResult<()> {
        let labels = args::labels(args)?;
        self.emit(Severity::Error, msg, err, labels.clone());

        if let Some(reporter) = self.inner.client.load_full() {
            reporter.report(self.entry(err, labels));
        }
        Ok(())
    }

    /// Log `err` at fatal severity, report it, then take the sink's fatal path
    ///
    /// The report is synchronous, bounded by the client's flush timeout,
    /// since the process is about to end. A malformed `args` list does not
    /// stop termination: the record goes out without labels.
    pub fn fatal(&self, msg: &str, err: &dyn Error, args: &[Value]) -> ! {
        let labels = args::labels(args).unwrap_or_else(|e| {
            tracing::error!(logger = %self.inner.name, error = %e, "dropping labels of fatal record");
            BTreeMap::new()
        });
        self.emit(Severity::Fatal, msg, err, labels.clone());
        self.inner.sink.flush();

        if let Some(reporter) = self.inner.client.load_full() {
            let context = ReportContext::current();
            if let Err(e) = reporter.report_sync(&context, self.entry(err, labels)) {
                tracing::error!(logger = %self.inner.name, error = %e, "failed to report fatal error");
            }
        }

        self.inner.sink.terminate()
    }

    fn emit(&self, severity: Severity, msg: &str, err: &dyn Error, labels: BTreeMap<String, String>) {
        let record = Record::new(severity, msg)
            .with_error(err.to_string())
            .with_labels(labels);
        self.inner.sink.write(&record);
    }

    fn entry(&self, err: &dyn Error, labels: BTreeMap<String, String>) -> ErrorEntry {
        ErrorEntry::from_error(err)
            .with_logger(self.inner.name.as_str())
            .with_labels(labels)
            .with_context((*ReportContext::current()).clone())
    }
}
