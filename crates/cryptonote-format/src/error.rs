//! Error types for the format facade.

use cryptonote_format_core::{CodecError, HashError};
use thiserror::Error;

/// Errors that can occur while parsing, encoding or hashing chain objects.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Malformed or non-canonical bytes, or a value that cannot be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Hash computation or verification failed.
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// A tx_extra blob above the configured limit.
    #[error("tx_extra of {size} bytes exceeds limit of {max}")]
    ExtraTooLarge { size: usize, max: usize },

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for format operations.
pub type Result<T> = std::result::Result<T, FormatError>;
