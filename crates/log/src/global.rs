//! Process-wide logging context
//!
//! Free functions over one lazily created [`Logging`] with Cloud Logging
//! defaults and the build's default connector. Libraries that want isolated
//! state should hold their own [`Logging`] instead.

use std::sync::LazyLock;

use crate::config::Config;
use crate::core::{InitError, ReportError};
use crate::logger::Logger;
use crate::logging::Logging;
use crate::panic::PanicReportGuard;
use crate::report::{Identity, ReportContext};
use crate::severity::Severity;

static GLOBAL: LazyLock<Logging> = LazyLock::new(Logging::new);

/// The process-wide context
pub fn logging() -> &'static Logging {
    &GLOBAL
}

/// See [`Logging::new_logger`]
pub fn new_logger(config: Config) -> Logger {
    GLOBAL.new_logger(config)
}

/// See [`Logging::logger`]
pub fn logger(name: impl Into<String>) -> Logger {
    GLOBAL.logger(name)
}

/// See [`Logging::set_global_level`]
pub fn set_global_level(level: Severity) {
    GLOBAL.set_global_level(level);
}

/// See [`Logging::init_error_reporting`]
pub fn init_error_reporting(identity: Identity) -> Result<(), InitError> {
    GLOBAL.init_error_reporting(identity)
}

/// See [`Logging::setup_error_reporting`]
pub fn setup_error_reporting(
    identity: Identity,
    context: ReportContext,
) -> Result<PanicReportGuard, InitError> {
    GLOBAL.setup_error_reporting(identity, context)
}

/// See [`Logging::has_error_reporting`]
pub fn has_error_reporting() -> bool {
    GLOBAL.has_error_reporting()
}

/// See [`Logging::close_client`]
pub fn close_client() -> Result<(), ReportError> {
    GLOBAL.close_client()
}

/// See [`Logging::report_error`]
pub fn report_error(err: &dyn std::error::Error) {
    GLOBAL.report_error(err);
}

/// Armed panic guard on the process-wide client, see [`Logging::make_report_panics`]
pub fn report_panics(context: ReportContext) -> PanicReportGuard {
    GLOBAL.make_report_panics(context)
}

/// See [`Logging::catch_and_report`]
pub fn catch_and_report<R>(context: ReportContext, work: impl FnOnce() -> R) -> R {
    GLOBAL.catch_and_report(context, work)
}
