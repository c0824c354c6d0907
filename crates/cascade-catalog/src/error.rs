//! Error types for catalog operations.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog or dist document is structurally malformed.
    #[error("document format error: {message}")]
    DocumentFormat {
        /// Description of the structural fault.
        message: String,
    },

    /// Promotion was requested for a track that is not an auto-promotion
    /// target.
    #[error("invalid promotion track: {track}")]
    InvalidTrack {
        /// The rejected track name.
        track: String,
    },

    /// Mutually exclusive arguments were both supplied.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of the argument conflict.
        message: String,
    },

    /// Serialization or deserialization of a catalog document failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] cascade_core::Error),
}

impl CatalogError {
    /// Creates a document format error with the given message.
    #[must_use]
    pub fn document_format(message: impl Into<String>) -> Self {
        Self::DocumentFormat {
            message: message.into(),
        }
    }
}
