//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use una_log::{
    Connector, ErrorEntry, Identity, InitError, ReportBackend, ReportContext, ReportError,
};

/// Backend recording every submission
#[derive(Default)]
pub struct RecordingBackend {
    pub synced: Mutex<Vec<(ReportContext, ErrorEntry)>>,
    pub queued: Mutex<Vec<ErrorEntry>>,
    pub closes: AtomicUsize,
    /// Refuse every synchronous submission after recording it
    pub reject_sync: bool,
}

impl RecordingBackend {
    pub fn synced_messages(&self) -> Vec<String> {
        self.synced.lock().iter().map(|(_, e)| e.message.clone()).collect()
    }

    pub fn queued_messages(&self) -> Vec<String> {
        self.queued.lock().iter().map(|e| e.message.clone()).collect()
    }
}

impl ReportBackend for RecordingBackend {
    fn submit_sync(
        &self,
        context: &ReportContext,
        entry: &ErrorEntry,
        _deadline: Duration,
    ) -> Result<(), ReportError> {
        self.synced.lock().push((context.clone(), entry.clone()));
        if self.reject_sync {
            return Err(ReportError::Rejected("backend refused".to_string()));
        }
        Ok(())
    }

    fn submit_async(&self, entry: ErrorEntry) {
        self.queued.lock().push(entry);
    }

    fn close(&self, _deadline: Duration) -> Result<(), ReportError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out one shared recording backend
#[derive(Clone, Default)]
pub struct RecordingConnector {
    pub backend: Arc<RecordingBackend>,
    pub connects: Arc<AtomicUsize>,
}

impl Connector for RecordingConnector {
    fn connect(&self, identity: &Identity) -> Result<Arc<dyn ReportBackend>, InitError> {
        if identity.project.is_empty() {
            return Err(InitError::InvalidIdentity {
                reason: "empty project".to_string(),
            });
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.backend.clone())
    }
}

impl RecordingConnector {
    /// Connector whose backend refuses synchronous submissions
    pub fn rejecting() -> Self {
        Self {
            backend: Arc::new(RecordingBackend {
                reject_sync: true,
                ..RecordingBackend::default()
            }),
            ..Self::default()
        }
    }
}

pub fn identity() -> Identity {
    Identity::new("test-project", "test-service", "v1.0")
}

#[derive(Debug, thiserror::Error)]
#[error("Something is wrong")]
pub struct SomethingWrong;
