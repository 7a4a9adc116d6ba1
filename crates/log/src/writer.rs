//! Writer implementations

// Standard library
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

// External dependencies
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// Internal crates
use crate::core::{LogError, LogResult};

/// Boxed output a sink writes rendered records to
pub type BoxWriter = Box<dyn Write + Send>;

/// Default output when no file redirect is configured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Write to stdout
    #[default]
    Stdout,
    /// Write to stderr
    Stderr,
}

/// Create the writer for a default target
pub fn make_writer(target: Target) -> BoxWriter {
    match target {
        Target::Stdout => Box::new(io::stdout()),
        Target::Stderr => Box::new(io::stderr()),
    }
}

/// Create (or truncate) `path` and return it as a writer
pub fn open_file(path: &Path) -> LogResult<BoxWriter> {
    let file = File::create(path).map_err(|source| LogError::FileRedirect {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(file))
}

/// Clonable in-memory writer
///
/// Every clone appends to the same buffer, so a test can hand one clone to a
/// logger and read the output back through another.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().clone()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    /// Written output split into lines, empty lines dropped
    pub fn lines(&self) -> Vec<String> {
        self.contents_string()
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Discard everything written so far
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
