//! Error types for llbdump-core.

use thiserror::Error;

use crate::digest::Digest;

/// Result type alias for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;

/// Errors that abort a dump. Highlighting failures are not errors; the
/// highlighter falls back to plain output.
#[derive(Error, Debug)]
pub enum DumpError {
    /// The input is not an encoded LLB definition.
    #[error("failed to parse definition: {0}")]
    InvalidDefinition(#[source] prost::DecodeError),

    /// An op blob does not decode as an LLB op.
    #[error("failed to parse op #{index}: {source}")]
    Decode {
        /// Position of the blob in the definition.
        index: usize,
        #[source]
        source: prost::DecodeError,
    },

    /// The format selector is not one of the known formats.
    #[error("unknown format: {format}")]
    UnsupportedFormat {
        /// The value that was requested.
        format: String,
    },

    /// A node could not be encoded by the selected renderer.
    #[error("failed to render op {digest}: {message}")]
    Render {
        /// Digest of the offending node.
        digest: Digest,
        /// Underlying encoder message.
        message: String,
    },

    /// Writing to the output stream failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl DumpError {
    pub(crate) fn render(digest: &Digest, err: impl std::fmt::Display) -> Self {
        DumpError::Render {
            digest: digest.clone(),
            message: err.to_string(),
        }
    }
}
