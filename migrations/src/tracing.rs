//! Tracing helpers for diff and sort decisions.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]`
//! boilerplate at every call site.

/// Emit a debug-level event for a per-key diff classification.
///
/// ```ignore
/// trace_diff!(DiffType::Alter, &key);
/// ```
macro_rules! trace_diff {
    ($diff_type:expr, $key:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(diff = ?$diff_type, key = %$key, "pgcompose.diff");
        #[cfg(not(feature = "tracing"))]
        let _ = (&$diff_type, &$key);
    };
}

/// Emit a warn-level event when an object degrades to the generic fallback.
macro_rules! trace_fallback {
    ($key:expr, $reason:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(key = %$key, reason = %$reason, "pgcompose.fallback");
        #[cfg(not(feature = "tracing"))]
        let _ = (&$key, &$reason);
    };
}

/// Emit a debug-level summary of a completed sort.
macro_rules! trace_sort {
    ($nodes:expr, $edges:expr, $unnamed:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(
            nodes = $nodes,
            edges = $edges,
            unnamed = $unnamed,
            "pgcompose.sort"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (&$nodes, &$edges, &$unnamed);
    };
}

pub(crate) use {trace_diff, trace_fallback, trace_sort};
