//! Error types for decoding operations

use thiserror::Error;

/// Result type alias for decoding operations
pub type DecoderResult<T> = Result<T, DecoderError>;

/// Errors reported at the decoding entry points.
///
/// Lexicon misses during beam expansion are normal flow control and never
/// surface here; numeric underflow is masked by the probability floor.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// A probability frame does not match the expected vocabulary width
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// A configuration value is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Lexicon construction failed
    #[error("lexicon error: {0}")]
    Lexicon(String),

    /// The batch worker pool could not be built
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}
