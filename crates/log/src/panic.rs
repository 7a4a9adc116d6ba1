//! Panic-report guard
//!
//! A [`PanicReportGuard`] wraps a unit of work: it catches a panic raised by
//! the work, reports it synchronously through the error-report client and
//! then resumes unwinding with a new payload, so the failure still reaches
//! the caller (or ends the thread) after it has been recorded.
//!
//! ```rust,no_run
//! use una_log::{Identity, Logging, ReportContext};
//!
//! let logging = Logging::new();
//! logging
//!     .init_error_reporting(Identity::from_env())
//!     .expect("error reporting");
//!
//! let total = logging
//!     .make_report_panics(ReportContext::new().with_request_id("r-42"))
//!     .run(|| 40 + 2);
//! assert_eq!(total, 42);
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crate::report::{ClientSlot, ErrorEntry, ReportContext};

/// Prefix of the payload a guard re-raises with
pub const REPANIC_PREFIX: &str = "Repanicked from logger: ";

/// Message reported for payloads that are neither `&str` nor `String`
pub const NON_STRING_PAYLOAD: &str = "non-string panic payload";

/// Guard lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Created, not yet fired
    Armed,
    /// Fired once; later firings never report
    Fired,
}

/// Scoped catch-report-repanic action
#[derive(Debug)]
#[must_use = "a panic guard does nothing until it runs or fires"]
pub struct PanicReportGuard {
    slot: ClientSlot,
    context: ReportContext,
    state: GuardState,
}

impl PanicReportGuard {
    pub(crate) fn new(slot: ClientSlot, context: ReportContext) -> Self {
        Self {
            slot,
            context,
            state: GuardState::Armed,
        }
    }

    /// Current state
    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Context attached to the report
    pub fn context(&self) -> &ReportContext {
        &self.context
    }

    /// Run `work`, reporting and re-raising a panic it raises
    pub fn run<R>(mut self, work: impl FnOnce() -> R) -> R {
        let outcome = panic::catch_unwind(AssertUnwindSafe(work));
        self.fire(outcome)
    }

    /// Fire with an already caught outcome
    ///
    /// On the first call an error-report client must exist; its absence is a
    /// wiring bug and panics. `Ok` passes through untouched. `Err` is
    /// reported synchronously, bounded by the client's flush timeout, and
    /// unwinding resumes with a `String` payload starting with
    /// [`REPANIC_PREFIX`]. A failed submission is only logged.
    ///
    /// Later calls never report: `Ok` passes through, `Err` resumes unchanged.
    pub fn fire<R>(&mut self, outcome: thread::Result<R>) -> R {
        if self.state == GuardState::Fired {
            return match outcome {
                Ok(value) => value,
                Err(payload) => panic::resume_unwind(payload),
            };
        }
        self.state = GuardState::Fired;

        let Some(reporter) = self.slot.load_full() else {
            panic!(
                "programmer error: panic guard fired before error reporting was initialized"
            );
        };

        let payload = match outcome {
            Ok(value) => return value,
            Err(payload) => payload,
        };

        let message = payload_message(payload.as_ref());
        let entry = ErrorEntry::panic(message.as_str()).with_context(self.context.clone());
        if let Err(e) = reporter.report_sync(&self.context, entry) {
            tracing::error!(error = %e, panic = %message, "failed to report panic");
        }

        drop(payload);
        panic::resume_unwind(Box::new(format!("{REPANIC_PREFIX}{message}")))
    }
}

/// Display form of a panic payload
///
/// `&str` and `String` payloads are returned verbatim; any other payload
/// becomes [`NON_STRING_PAYLOAD`].
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        NON_STRING_PAYLOAD.to_string()
    }
}
