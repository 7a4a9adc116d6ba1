//! Key/value argument lists
//!
//! Logging calls take their structured data as a flat, alternating
//! `key, value, key, value, ...` slice of [`serde_json::Value`]s. Keys must be
//! strings and every key needs a value; anything else is rejected with
//! [`LogError::InvalidArguments`] before a record is built.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::{LogError, LogResult};

/// Split a flat argument slice into `(key, value)` pairs
pub fn pairs(args: &[Value]) -> LogResult<Vec<(&str, &Value)>> {
    if args.len() % 2 != 0 {
        return Err(LogError::invalid_arguments(format!(
            "odd number of key/value arguments ({}), last key has no value",
            args.len()
        )));
    }

    args.chunks_exact(2)
        .enumerate()
        .map(|(i, chunk)| match &chunk[0] {
            Value::String(key) => Ok((key.as_str(), &chunk[1])),
            other => Err(LogError::invalid_arguments(format!(
                "key at position {} must be a string, got {other}",
                i * 2
            ))),
        })
        .collect()
}

/// Build the labels mapping of an error record
///
/// Values are coerced to their display form; a repeated key keeps the last value.
pub fn labels(args: &[Value]) -> LogResult<BTreeMap<String, String>> {
    Ok(pairs(args)?
        .into_iter()
        .map(|(key, value)| (key.to_string(), display(value)))
        .collect())
}

/// Display form of a value: strings verbatim, everything else as JSON text
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
