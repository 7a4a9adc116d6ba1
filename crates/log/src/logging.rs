//! Logging context: registry, shared schema and error-report client
//!
//! A [`Logging`] is the explicit owner of the state loggers share. Hosts
//! create one (or use the process-wide instance in [`crate::global`]) and
//! build every logger through it.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::Config;
use crate::core::{InitError, ReportError};
use crate::logger::Logger;
use crate::panic::PanicReportGuard;
use crate::registry::LoggerRegistry;
use crate::report::{self, ClientSlot, Connector, ErrorEntry, ErrorReporter, Identity, ReportContext};
use crate::schema::{self, CloudLoggingDefaults, Defaults, Schema, SharedSchema};
use crate::severity::Severity;
use crate::sink::{JsonSink, Sink};
use crate::writer;

/// Shared logging state
///
/// Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Logging {
    shared: Arc<Shared>,
}

struct Shared {
    registry: LoggerRegistry,
    schema: SharedSchema,
    defaults: Box<dyn Defaults>,
    connector: Option<Arc<dyn Connector>>,
    client: ClientSlot,
}

impl std::fmt::Debug for Logging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logging")
            .field("loggers", &self.shared.registry.len())
            .field("error_reporting", &self.has_error_reporting())
            .finish_non_exhaustive()
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Logging`]
pub struct LoggingBuilder {
    defaults: Box<dyn Defaults>,
    connector: Option<Arc<dyn Connector>>,
}

impl std::fmt::Debug for LoggingBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingBuilder")
            .field("connector", &self.connector.is_some())
            .finish_non_exhaustive()
    }
}

impl LoggingBuilder {
    /// Replace the one-time schema remapping
    pub fn defaults(mut self, defaults: impl Defaults + 'static) -> Self {
        self.defaults = Box::new(defaults);
        self
    }

    /// Use `connector` to build error-report clients
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Build without any connector; `init_error_reporting` then fails
    pub fn without_connector(mut self) -> Self {
        self.connector = None;
        self
    }

    /// Finish
    pub fn build(self) -> Logging {
        Logging {
            shared: Arc::new(Shared {
                registry: LoggerRegistry::default(),
                schema: schema::shared(Schema::default()),
                defaults: self.defaults,
                connector: self.connector,
                client: Arc::new(ArcSwapOption::empty()),
            }),
        }
    }
}

impl Logging {
    /// Cloud Logging defaults and the build's default connector
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a `Logging`
    pub fn builder() -> LoggingBuilder {
        LoggingBuilder {
            defaults: Box::new(CloudLoggingDefaults),
            connector: report::default_connector(),
        }
    }

    // ---- logger registry -------------------------------------------------

    /// Create and register a JSON logger
    ///
    /// When `config.file` is set the file is created (or truncated) and used
    /// as output. If that fails the logger still works, writing to
    /// `config.target`; the failure is traced once and kept in
    /// [`Logger::redirect_failure`].
    pub fn new_logger(&self, config: Config) -> Logger {
        // opened before registration, the registry lock never spans file IO
        let (output, redirect_failure) = match &config.file {
            Some(path) => match writer::open_file(path) {
                Ok(file) => (file, None),
                Err(e) => {
                    tracing::warn!(
                        logger = %config.name,
                        error = %e,
                        "file redirect failed, using default target"
                    );
                    (writer::make_writer(config.target), Some(e))
                }
            },
            None => (writer::make_writer(config.target), None),
        };

        let sink = JsonSink::new(config.name.as_str(), output, Arc::clone(&self.shared.schema))
            .with_level(config.initial_level())
            .with_fatal_action(config.on_fatal);

        self.register(config.name, Arc::new(sink), redirect_failure)
    }

    /// Create a logger named `name` with default configuration
    pub fn logger(&self, name: impl Into<String>) -> Logger {
        self.new_logger(Config::new(name))
    }

    /// Register a logger backed by a caller supplied sink
    pub fn logger_with_sink(&self, name: impl Into<String>, sink: Arc<dyn Sink>) -> Logger {
        self.register(name.into(), sink, None)
    }

    fn register(
        &self,
        name: String,
        sink: Arc<dyn Sink>,
        redirect_failure: Option<crate::LogError>,
    ) -> Logger {
        let shared = &self.shared;
        shared.registry.register(&name, Arc::clone(&sink), || {
            let mut schema = Schema::clone(&shared.schema.load());
            shared.defaults.apply(&mut schema);
            shared.schema.store(Arc::new(schema));
        });

        Logger::new(name, sink, Arc::clone(&shared.client), redirect_failure)
    }

    /// Set the severity threshold of every logger, current and future
    pub fn set_global_level(&self, level: Severity) {
        self.shared.registry.set_level(level);
        tracing::debug!(%level, "global log level changed");
    }

    /// Last level set through [`set_global_level`](Self::set_global_level)
    pub fn global_level(&self) -> Option<Severity> {
        self.shared.registry.global_level()
    }

    /// Number of loggers created through this context
    pub fn logger_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Names of loggers created through this context, oldest first
    pub fn logger_names(&self) -> Vec<String> {
        self.shared.registry.names()
    }

    /// Whether the one-time schema defaults have run
    pub fn defaults_applied(&self) -> bool {
        self.shared.registry.defaults_applied()
    }

    /// Current record schema
    pub fn schema(&self) -> Arc<Schema> {
        self.shared.schema.load_full()
    }

    // ---- error reporting ---------------------------------------------------

    /// Create the error-report client for `identity`
    ///
    /// Replaces a previous client without closing it; call
    /// [`close_client`](Self::close_client) first when its cleanup matters.
    pub fn init_error_reporting(&self, identity: Identity) -> Result<(), InitError> {
        let connector = self.shared.connector.as_deref().ok_or(InitError::NoBackend)?;
        let reporter = ErrorReporter::connect(connector, identity)?;

        if self.shared.client.swap(Some(Arc::new(reporter))).is_some() {
            tracing::debug!("error reporting client replaced without close");
        }
        Ok(())
    }

    /// [`init_error_reporting`](Self::init_error_reporting) plus an armed guard
    pub fn setup_error_reporting(
        &self,
        identity: Identity,
        context: ReportContext,
    ) -> Result<PanicReportGuard, InitError> {
        self.init_error_reporting(identity)?;
        Ok(self.make_report_panics(context))
    }

    /// Whether an error-report client is live
    pub fn has_error_reporting(&self) -> bool {
        self.shared.client.load().is_some()
    }

    /// Close and drop the error-report client
    ///
    /// Must be paired with a successful
    /// [`init_error_reporting`](Self::init_error_reporting); calling it
    /// without a client is a wiring bug and panics.
    pub fn close_client(&self) -> Result<(), ReportError> {
        let Some(reporter) = self.shared.client.swap(None) else {
            panic!("programmer error: close_client called without an error reporting client");
        };
        reporter.close()
    }

    /// Hand `err` to the client without waiting; no-op without a client
    pub fn report_error(&self, err: &dyn std::error::Error) {
        if let Some(reporter) = self.shared.client.load_full() {
            let entry = ErrorEntry::from_error(err).with_context((*ReportContext::current()).clone());
            reporter.report(entry);
        }
    }

    /// Create an armed panic guard reporting with `context`
    pub fn make_report_panics(&self, context: ReportContext) -> PanicReportGuard {
        PanicReportGuard::new(Arc::clone(&self.shared.client), context)
    }

    /// Run `work`, reporting and re-raising a panic it raises
    pub fn catch_and_report<R>(&self, context: ReportContext, work: impl FnOnce() -> R) -> R {
        self.make_report_panics(context).run(work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::SharedBuffer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_logger_applies_defaults() {
        let logging = Logging::builder().without_connector().build();
        assert_eq!(logging.schema().level_key, "level");

        let _logger = logging.logger("first");
        assert_eq!(logging.schema().level_key, "severity");
        assert_eq!(logging.schema().label(Severity::Fatal), "CRITICAL");
    }

    #[test]
    fn test_set_global_level_then_new_logger() {
        let logging = Logging::builder().without_connector().build();
        let before = logging.logger("before");

        logging.set_global_level(Severity::Debug);
        let after = logging.new_logger(Config::new("after").with_level(Severity::Error));

        assert!(before.is_debug());
        assert!(after.is_debug());
        assert_eq!(logging.global_level(), Some(Severity::Debug));
        assert_eq!(logging.logger_names(), vec!["before", "after"]);
    }

    #[test]
    fn test_init_without_connector_fails() {
        let logging = Logging::builder().without_connector().build();
        let err = logging
            .init_error_reporting(Identity::new("p", "svc", "1"))
            .unwrap_err();
        assert!(matches!(err, InitError::NoBackend));
        assert!(!logging.has_error_reporting());
    }

    #[test]
    #[should_panic(expected = "programmer error")]
    fn test_close_without_client_panics() {
        let logging = Logging::builder().without_connector().build();
        let _ = logging.close_client();
    }

    #[test]
    fn test_report_error_without_client_is_noop() {
        let logging = Logging::builder().without_connector().build();
        let err = std::io::Error::other("nobody listens");
        logging.report_error(&err);
    }

    #[test]
    fn test_logger_with_custom_sink_is_registered() {
        let logging = Logging::builder().without_connector().build();
        let buffer = SharedBuffer::new();
        let sink = JsonSink::new("custom", Box::new(buffer.clone()), schema::shared(Schema::default()));

        let logger = logging.logger_with_sink("custom", Arc::new(sink));
        logger.info("hi", &[]).unwrap();

        assert_eq!(logging.logger_count(), 1);
        assert_eq!(buffer.lines().len(), 1);
    }
}
