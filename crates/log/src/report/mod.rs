//! Error-report client
//!
//! The remote error-tracking backend is reached through two traits:
//! - [`Connector`] builds a backend from an [`Identity`]
//! - [`ReportBackend`] submits entries, synchronously or fire-and-forget
//!
//! [`ErrorReporter`] is the client a [`Logging`](crate::Logging) stores once
//! `init_error_reporting` succeeds. It bounds synchronous submissions with
//! the identity's flush timeout, whatever the backend does.

mod context;
#[cfg(feature = "sentry")]
pub mod sentry;

use std::collections::BTreeMap;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

pub use context::{ContextGuard, ReportContext};

use crate::core::{InitError, ReportError};

/// Default crash-path deadline for synchronous reports
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Who is reporting: project, service and version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    /// Backend project; the DSN for the Sentry backend
    pub project: String,
    /// Service name
    pub service: String,
    /// Service version, sent as the release
    pub version: String,
    /// Deployment environment
    pub environment: Option<String>,
    /// Upper bound for synchronous submissions and close
    pub flush_timeout: Duration,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            project: String::new(),
            service: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: None,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl Identity {
    /// Identity for `service` at `version` in `project`
    pub fn new(
        project: impl Into<String>,
        service: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            service: service.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Set the deployment environment
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Set the synchronous submission deadline
    #[must_use]
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Read identity from `SENTRY_DSN`, `UNA_SERVICE`, `UNA_VERSION` and `UNA_ENV`
    #[must_use]
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let mut identity = Self::default();
        if let Some(project) = var("SENTRY_DSN") {
            identity.project = project;
        }
        if let Some(service) = var("UNA_SERVICE") {
            identity.service = service;
        }
        if let Some(version) = var("UNA_VERSION") {
            identity.version = version;
        }
        identity.environment = var("UNA_ENV");
        identity
    }
}

/// What produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// An error passed to `error` or `fatal`
    Error,
    /// A panic intercepted by a guard
    Panic,
}

/// One error or panic, as sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// What produced the entry
    pub kind: EntryKind,
    /// Display form of the error or the panic message
    pub message: String,
    /// Display forms of the error's sources, outermost first
    pub chain: Vec<String>,
    /// Name of the logger that reported it
    pub logger: Option<String>,
    /// Labels of the logging call
    pub labels: BTreeMap<String, String>,
    /// Context current on the reporting thread
    pub context: ReportContext,
}

impl ErrorEntry {
    /// Entry for `err` and its source chain
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        Self {
            kind: EntryKind::Error,
            message: err.to_string(),
            chain,
            logger: None,
            labels: BTreeMap::new(),
            context: ReportContext::default(),
        }
    }

    /// Entry for a panic with `message`
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Panic,
            message: message.into(),
            chain: Vec::new(),
            logger: None,
            labels: BTreeMap::new(),
            context: ReportContext::default(),
        }
    }

    /// Set the reporting logger
    #[must_use]
    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    /// Set the labels
    #[must_use]
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Set the context
    #[must_use]
    pub fn with_context(mut self, context: ReportContext) -> Self {
        self.context = context;
        self
    }
}

/// Remote error-tracking backend
pub trait ReportBackend: Send + Sync + 'static {
    /// Submit `entry` and wait until delivered, failed, or `deadline` passed
    fn submit_sync(
        &self,
        context: &ReportContext,
        entry: &ErrorEntry,
        deadline: Duration,
    ) -> Result<(), ReportError>;

    /// Queue `entry` without waiting
    fn submit_async(&self, entry: ErrorEntry);

    /// Flush pending entries and release the connection
    fn close(&self, deadline: Duration) -> Result<(), ReportError>;
}

/// Builds a backend from an identity
pub trait Connector: Send + Sync + 'static {
    /// Create a backend for `identity`
    fn connect(&self, identity: &Identity) -> Result<Arc<dyn ReportBackend>, InitError>;
}

/// Live error-report client
pub struct ErrorReporter {
    identity: Identity,
    backend: Arc<dyn ReportBackend>,
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("service", &self.identity.service)
            .field("version", &self.identity.version)
            .finish_non_exhaustive()
    }
}

impl ErrorReporter {
    /// Wrap a connected backend
    pub fn new(identity: Identity, backend: Arc<dyn ReportBackend>) -> Self {
        Self { identity, backend }
    }

    /// Connect through `connector`
    pub fn connect(connector: &dyn Connector, identity: Identity) -> Result<Self, InitError> {
        let backend = connector.connect(&identity)?;
        Ok(Self::new(identity, backend))
    }

    /// Identity the client was created with
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Fire-and-forget submission
    pub fn report(&self, entry: ErrorEntry) {
        self.backend.submit_async(entry);
    }

    /// Submit and wait at most the identity's flush timeout
    ///
    /// The backend runs on a helper thread so a backend ignoring its
    /// deadline cannot hang the caller.
    pub fn report_sync(&self, context: &ReportContext, entry: ErrorEntry) -> Result<(), ReportError> {
        let deadline = self.identity.flush_timeout;
        let backend = Arc::clone(&self.backend);
        let context = context.clone();
        let (tx, rx) = mpsc::sync_channel(1);

        std::thread::Builder::new()
            .name("una-log-report".to_string())
            .spawn(move || {
                let _ = tx.send(backend.submit_sync(&context, &entry, deadline));
            })
            .map_err(|e| ReportError::Rejected(format!("failed to spawn report thread: {e}")))?;

        match rx.recv_timeout(deadline) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ReportError::Timeout(deadline)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ReportError::Rejected(
                "report thread exited without a result".to_string(),
            )),
        }
    }

    /// Flush and release the backend
    pub fn close(&self) -> Result<(), ReportError> {
        self.backend.close(self.identity.flush_timeout)
    }
}

/// Process-wide slot holding at most one live client
pub(crate) type ClientSlot = Arc<ArcSwapOption<ErrorReporter>>;

/// Default connector for this build
pub(crate) fn default_connector() -> Option<Arc<dyn Connector>> {
    #[cfg(feature = "sentry")]
    {
        Some(Arc::new(self::sentry::SentryConnector))
    }

    #[cfg(not(feature = "sentry"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("inner cause")]
    struct Inner;

    #[derive(Default)]
    struct SlowBackend {
        delay: Duration,
        synced: Mutex<Vec<String>>,
    }

    impl ReportBackend for SlowBackend {
        fn submit_sync(
            &self,
            _context: &ReportContext,
            entry: &ErrorEntry,
            _deadline: Duration,
        ) -> Result<(), ReportError> {
            std::thread::sleep(self.delay);
            self.synced.lock().push(entry.message.clone());
            Ok(())
        }

        fn submit_async(&self, _entry: ErrorEntry) {}

        fn close(&self, _deadline: Duration) -> Result<(), ReportError> {
            Ok(())
        }
    }

    #[test]
    fn test_entry_collects_source_chain() {
        let entry = ErrorEntry::from_error(&Outer(Inner)).with_logger("api");

        assert_eq!(entry.kind, EntryKind::Error);
        assert_eq!(entry.message, "outer failure");
        assert_eq!(entry.chain, vec!["inner cause".to_string()]);
        assert_eq!(entry.logger.as_deref(), Some("api"));
    }

    #[test]
    fn test_report_sync_waits_for_backend() {
        let backend = Arc::new(SlowBackend::default());
        let reporter = ErrorReporter::new(Identity::new("p", "svc", "1.0"), backend.clone());
        assert_eq!(reporter.identity().service, "svc");

        reporter
            .report_sync(&ReportContext::new(), ErrorEntry::panic("WOOT"))
            .unwrap();

        assert_eq!(*backend.synced.lock(), vec!["WOOT".to_string()]);
    }

    #[test]
    fn test_report_sync_is_bounded_by_flush_timeout() {
        let backend = Arc::new(SlowBackend {
            delay: Duration::from_secs(5),
            ..SlowBackend::default()
        });
        let identity =
            Identity::new("p", "svc", "1.0").with_flush_timeout(Duration::from_millis(50));
        let reporter = ErrorReporter::new(identity, backend);

        let started = std::time::Instant::now();
        let err = reporter
            .report_sync(&ReportContext::new(), ErrorEntry::panic("slow"))
            .unwrap_err();

        assert!(matches!(err, ReportError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_identity_defaults() {
        let identity = Identity::new("dsn", "svc", "v1.0").with_environment("staging");
        assert_eq!(identity.flush_timeout, DEFAULT_FLUSH_TIMEOUT);
        assert_eq!(identity.environment.as_deref(), Some("staging"));
    }
}
