//! Log severities and the atomic threshold each sink carries

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::LogError;

/// Record severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail, off by default
    Debug,
    /// Normal operation
    Info,
    /// Failure that the process survives
    Error,
    /// Failure that ends the process
    #[serde(alias = "critical")]
    Fatal,
}

impl Severity {
    /// All severities, least severe first
    pub const ALL: [Self; 4] = [Self::Debug, Self::Info, Self::Error, Self::Fatal];

    /// Lowercase name, also the unmapped label in records
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Error => 2,
            Self::Fatal => 3,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Error,
            _ => Self::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "error" => Ok(Self::Error),
            "fatal" | "critical" => Ok(Self::Fatal),
            other => Err(LogError::Config(format!("unknown severity '{other}'"))),
        }
    }
}

/// Severity threshold that can be changed while other threads log
#[derive(Debug)]
pub(crate) struct LevelCell(AtomicU8);

impl LevelCell {
    pub(crate) fn new(level: Severity) -> Self {
        Self(AtomicU8::new(level.to_u8()))
    }

    pub(crate) fn get(&self) -> Severity {
        Severity::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, level: Severity) {
        self.0.store(level.to_u8(), Ordering::Release);
    }

    pub(crate) fn allows(&self, severity: Severity) -> bool {
        severity >= self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("debug", Severity::Debug)]
    #[case("INFO", Severity::Info)]
    #[case(" error ", Severity::Error)]
    #[case("fatal", Severity::Fatal)]
    #[case("critical", Severity::Fatal)]
    fn test_parse(#[case] input: &str, #[case] expected: Severity) {
        assert_eq!(input.parse::<Severity>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "warning".parse::<Severity>().unwrap_err();
        assert!(matches!(err, LogError::Config(_)));
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for severity in Severity::ALL {
            assert_eq!(severity.to_string().parse::<Severity>().unwrap(), severity);
        }
    }

    #[test]
    fn test_level_cell_threshold() {
        let cell = LevelCell::new(Severity::Info);
        assert!(!cell.allows(Severity::Debug));
        assert!(cell.allows(Severity::Info));
        assert!(cell.allows(Severity::Fatal));

        cell.set(Severity::Debug);
        assert_eq!(cell.get(), Severity::Debug);
        assert!(cell.allows(Severity::Debug));
    }

    #[test]
    fn test_serde_accepts_critical_alias() {
        let parsed: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, Severity::Fatal);
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
    }
}
