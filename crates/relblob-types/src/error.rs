use thiserror::Error;

/// Errors produced while laying out or reading a blob.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// A precondition on an argument was violated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An element index fell outside `[0, length)`.
    #[error("index {index} out of range for length {length}")]
    OutOfRange { index: usize, length: usize },

    /// A sorted-array lookup found no equal key.
    #[error("key not found")]
    NotFound,

    /// A region addressed inside the blob extends past its end.
    #[error("region of {size} bytes at position {position} exceeds blob length {length}")]
    OutOfBounds {
        position: i64,
        size: usize,
        length: usize,
    },

    /// The bytes could not be reinterpreted in place.
    #[error("alignment error: {0}")]
    Alignment(#[from] bytemuck::PodCastError),

    /// Encoded text inside the blob is malformed.
    #[error("invalid {encoding} text: {reason}")]
    InvalidText {
        encoding: &'static str,
        reason: String,
    },
}

/// Convenience alias for blob results.
pub type BlobResult<T> = Result<T, BlobError>;
