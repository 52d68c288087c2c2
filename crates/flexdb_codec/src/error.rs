//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Failed to encode a snapshot.
    #[error("encoding failed: {0}")]
    EncodingFailed(#[source] serde_json::Error),

    /// Input is not a structurally valid snapshot.
    #[error("decoding failed at line {line}, column {column}: {source}")]
    DecodingFailed {
        /// Line of the offending input (1-based).
        line: usize,
        /// Column of the offending input (1-based).
        column: usize,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
}

impl CodecError {
    pub(crate) fn decoding(source: serde_json::Error) -> Self {
        Self::DecodingFailed {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}
