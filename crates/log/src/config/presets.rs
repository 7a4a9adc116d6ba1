//! Configuration presets for common scenarios

use super::Config;
use crate::severity::Severity;
use crate::writer::Target;

impl Config {
    /// Create configuration from environment variables
    ///
    /// - `UNA_LOG`: initial level (`debug`, `info`, `error`, `fatal`)
    /// - `UNA_LOG_FILE`: redirect output to this file
    /// - `UNA_LOG_TARGET`: `stdout` or `stderr`
    ///
    /// Unparseable values are ignored and reported through `tracing`.
    #[must_use]
    pub fn from_env(name: impl Into<String>) -> Self {
        Self::from_lookup(name, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        name: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut config = Self::new(name);

        if let Some(level) = lookup("UNA_LOG") {
            match level.parse::<Severity>() {
                Ok(level) => config.level = Some(level),
                Err(e) => tracing::warn!(error = %e, "ignoring UNA_LOG"),
            }
        }

        if let Some(file) = lookup("UNA_LOG_FILE").filter(|f| !f.is_empty()) {
            config.file = Some(file.into());
        }

        if let Some(target) = lookup("UNA_LOG_TARGET") {
            config.target = match target.to_lowercase().as_str() {
                "stderr" => Target::Stderr,
                _ => Target::Stdout,
            };
        }

        config
    }

    /// Development configuration (debug level, stderr)
    #[must_use]
    pub fn development(name: impl Into<String>) -> Self {
        Self {
            level: Some(Severity::Debug),
            target: Target::Stderr,
            ..Self::new(name)
        }
    }

    /// Production configuration (info level, stdout for the log agent)
    #[must_use]
    pub fn production(name: impl Into<String>) -> Self {
        Self {
            level: Some(Severity::Info),
            target: Target::Stdout,
            ..Self::new(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = Config::from_lookup(
            "svc",
            lookup(&[
                ("UNA_LOG", "debug"),
                ("UNA_LOG_FILE", "/var/log/svc.log"),
                ("UNA_LOG_TARGET", "STDERR"),
            ]),
        );

        assert_eq!(config.level, Some(Severity::Debug));
        assert_eq!(config.file.as_deref(), Some(std::path::Path::new("/var/log/svc.log")));
        assert_eq!(config.target, Target::Stderr);
    }

    #[test]
    fn test_from_lookup_ignores_bad_level() {
        let config = Config::from_lookup("svc", lookup(&[("UNA_LOG", "loud")]));
        assert_eq!(config.level, None);
    }

    #[test]
    fn test_presets() {
        assert_eq!(Config::development("a").initial_level(), Severity::Debug);
        assert_eq!(Config::development("a").target, Target::Stderr);
        assert_eq!(Config::production("a").initial_level(), Severity::Info);
    }
}
