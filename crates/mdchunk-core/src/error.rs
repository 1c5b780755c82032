//! Error types for the chunking core.
//!
//! Only two conditions are user-visible failures of a chunking call:
//! invalid parameters and a placeholder collision during block
//! protection. Messy input (odd heading depths, unterminated fences,
//! ragged tables) is never an error; it degrades to plain-text handling.

use thiserror::Error;

/// Errors returned by the chunking entry points.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// Invalid chunking parameters, raised before any processing begins.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Two different protected blocks mapped to the same placeholder, or a
    /// generated placeholder already occurs in the document text.
    ///
    /// Callers may retry with a salted protector
    /// ([`BlockProtector::with_salt`](crate::protect::BlockProtector::with_salt)).
    #[error("placeholder collision: {placeholder:?}")]
    PlaceholderCollision { placeholder: String },
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, ChunkError>;
