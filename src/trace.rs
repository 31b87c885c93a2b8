//! Conditional tracing hooks for the decoding pipeline.
//!
//! When the `tracing` feature is enabled, the macros below emit spans and
//! events through the `tracing` crate. Without the feature they compile to
//! nothing, so the hot path carries no instrumentation cost.
//!
//! # Usage
//!
//! ```rust,ignore
//! let _span = crate::trace_span!("decode_batch");
//! crate::trace_event!("decoding {} frames", probs.len());
//! ```

/// Create a tracing span (no-op when the `tracing` feature is disabled)
#[macro_export]
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr) => {
        tracing::span!(tracing::Level::DEBUG, $name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::span!(tracing::Level::DEBUG, $name, $($field)*)
    };
}

/// Create a tracing span (no-op when the `tracing` feature is disabled)
#[macro_export]
#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr) => {
        ()
    };
    ($name:expr, $($field:tt)*) => {
        ()
    };
}

/// Log a tracing event (no-op when the `tracing` feature is disabled)
#[macro_export]
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

/// Log a tracing event (no-op when the `tracing` feature is disabled)
#[macro_export]
#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($($arg:tt)*) => {};
}
