//! Registry of every logger created through a `Logging`
//!
//! The registry exists so a level change can fan out to every live logger.
//! Registration and fan-out serialize on one `parking_lot::Mutex`, which also
//! guards the one-shot defaults flag.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::severity::Severity;
use crate::sink::Sink;

struct Entry {
    name: String,
    sink: Arc<dyn Sink>,
}

#[derive(Default)]
struct State {
    entries: Vec<Entry>,
    defaults_applied: bool,
    global_level: Option<Severity>,
}

/// Append-only list of logger sinks
#[derive(Default)]
pub(crate) struct LoggerRegistry {
    state: Mutex<State>,
}

impl LoggerRegistry {
    /// Register a logger sink
    ///
    /// `apply_defaults` runs under the lock for the very first registration
    /// only. A level set through [`set_level`](Self::set_level) is applied to
    /// the new sink before the lock is released.
    pub(crate) fn register(
        &self,
        name: &str,
        sink: Arc<dyn Sink>,
        apply_defaults: impl FnOnce(),
    ) {
        let mut state = self.state.lock();

        if !state.defaults_applied {
            apply_defaults();
            state.defaults_applied = true;
        }
        if let Some(level) = state.global_level {
            sink.set_level(level);
        }

        state.entries.push(Entry {
            name: name.to_string(),
            sink,
        });
    }

    /// Set `level` on every registered sink and on every future one
    pub(crate) fn set_level(&self, level: Severity) {
        let mut state = self.state.lock();
        state.global_level = Some(level);
        for entry in &state.entries {
            entry.sink.set_level(level);
        }
    }

    /// Number of registered loggers
    pub(crate) fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Names of registered loggers, in registration order
    pub(crate) fn names(&self) -> Vec<String> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Whether the one-shot defaults ran
    pub(crate) fn defaults_applied(&self) -> bool {
        self.state.lock().defaults_applied
    }

    /// Last level set through [`set_level`](Self::set_level)
    pub(crate) fn global_level(&self) -> Option<Severity> {
        self.state.lock().global_level
    }
}
