//! Configuration types

mod presets;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::sink::FatalAction;
use crate::writer::Target;

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logger name, written into every record
    pub name: String,

    /// Redirect output to this file (created or truncated)
    ///
    /// Falls back to `target` when the file cannot be created.
    pub file: Option<PathBuf>,

    /// Output used when no file is configured or the redirect failed
    pub target: Target,

    /// Initial severity threshold
    ///
    /// A level set through [`Logging::set_global_level`](crate::Logging::set_global_level)
    /// takes precedence.
    pub level: Option<Severity>,

    /// What happens after a fatal record
    pub on_fatal: FatalAction,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            file: None,
            target: Target::Stdout,
            level: None,
            on_fatal: FatalAction::default(),
        }
    }
}

impl Config {
    /// Configuration for a logger named `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Redirect output to `path`
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Set the default output
    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Set the initial severity threshold
    #[must_use]
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = Some(level);
        self
    }

    /// Set the fatal path behaviour
    #[must_use]
    pub fn with_fatal_action(mut self, action: FatalAction) -> Self {
        self.on_fatal = action;
        self
    }

    /// Initial threshold, info when unset
    pub fn initial_level(&self) -> Severity {
        self.level.unwrap_or(Severity::Info)
    }
}
