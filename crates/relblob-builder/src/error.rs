use relblob_types::BlobError;
use thiserror::Error;

/// Errors that can occur while building a blob.
///
/// A failed build leaves its stream in an unspecified state; drop it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A layout or argument error from the format layer.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// A self-relative offset does not fit in an `i32` field.
    #[error("offset from {from} to {to} does not fit in 32 bits")]
    OffsetOverflow { from: usize, to: usize },

    /// A pointer targets a builder that has not been built yet.
    #[error("referenced builder has not been built yet")]
    Unresolved,

    /// The build configuration is invalid.
    #[error("invalid build configuration: {0}")]
    Config(String),
}

/// Convenience alias for build results.
pub type BuildResult<T> = Result<T, BuildError>;

/// Converts a length or index for storage in an `i32` field.
pub(crate) fn to_i32(value: usize, what: &str) -> BuildResult<i32> {
    i32::try_from(value).map_err(|_| {
        BuildError::Blob(BlobError::InvalidArgument(format!(
            "{what} {value} does not fit in 32 bits"
        )))
    })
}
