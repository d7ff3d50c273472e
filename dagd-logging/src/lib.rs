// Copyright (c) 2022 MASSA LABS <info@massa.net>

/// Emit a structured trace event: a static event name followed by its
/// parameters rendered as JSON.
///
/// Callers need `tracing` and `serde_json` in their own dependencies.
#[macro_export]
macro_rules! dagd_trace {
    ($evt:expr, $params:tt) => {
        tracing::trace!("dagd_trace:{}:{}", $evt, serde_json::json!($params));
    };
}
