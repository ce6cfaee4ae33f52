//! Timer error types.

use thiserror::Error;

/// Registration error type.
///
/// Everything else the scheduler does is infallible: unknown ids, misuse while
/// suspended and dead callback targets are absorbed silently.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimerError {
    /// Step must be finite and strictly positive.
    #[error("invalid step: {0} (must be finite and > 0)")]
    InvalidStep(f64),

    /// Delay must be finite and non-negative.
    #[error("invalid delay: {0} (must be finite and >= 0)")]
    InvalidDelay(f64),
}

/// Result type for timer registration.
pub type TimerResult<T> = Result<T, TimerError>;
