//! Wire codec error types.

use thiserror::Error;

/// Result type alias for codec operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while decoding a matrix from the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The shape descriptor is not two comma-separated non-negative integers.
    #[error("malformed shape descriptor: {0:?}")]
    MalformedShape(String),

    /// The payload is shorter than the shape descriptor requires.
    #[error("truncated payload: need {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },
}
