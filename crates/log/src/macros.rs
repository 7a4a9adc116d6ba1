//! Convenience macros for structured logging

/// Build a flat key/value argument list
///
/// ```rust
/// let args = una_log::fields!["user" => "ada", "attempt" => 3];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<$crate::serde_json::Value>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![
            $(
                $crate::serde_json::Value::from($key),
                $crate::serde_json::json!($value),
            )+
        ]
    };
}

/// Run a block, reporting any panic through the process-wide client
///
/// Expands to [`global::catch_and_report`](crate::global::catch_and_report)
/// with a default report context.
#[macro_export]
macro_rules! report_panics {
    ($body:block) => {
        $crate::global::catch_and_report($crate::ReportContext::default(), || $body)
    };
    ($ctx:expr, $body:block) => {
        $crate::global::catch_and_report($ctx, || $body)
    };
}
