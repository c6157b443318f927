//! Engine error types

use thiserror::Error;

/// Errors that can occur when constructing the engine
///
/// The per-block path has no error channel at all: misconfiguration there is
/// either clamped (delay overflow) or a fail-fast assertion (block size).
/// Everything that can legitimately fail does so at construction time, and a
/// partially constructed engine must not be used.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Sample rate of zero makes every ms-to-samples conversion meaningless
    #[error("sample rate must be nonzero")]
    InvalidSampleRate,

    /// An engine without voices has nothing to process
    #[error("engine needs at least one voice")]
    NoVoices,

    /// Scratch buffers cannot be sized from a zero block bound
    #[error("maximum block size must be nonzero")]
    ZeroBlockSize,

    /// Delay rings cannot be sized from a non-positive delay bound
    #[error("maximum delay must be positive, got {0} ms")]
    InvalidMaxDelay(f32),

    /// Substituted pitch engines must match the configured voice count
    #[error("expected {expected} pitch engines, got {got}")]
    VoiceCountMismatch { expected: usize, got: usize },
}

/// Result type for engine construction
pub type EngineResult<T> = Result<T, EngineError>;
