//! Error types for the CryptoNote format core.

use thiserror::Error;

use crate::types::Hash;

/// Errors produced while encoding or decoding the binary archive format.
///
/// `Clone` so that a failed [`BinaryReader`](crate::archive::BinaryReader) can
/// hand the same error back to every later call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },

    #[error("malformed length {length}: only {remaining} bytes remain")]
    MalformedLength { length: u64, remaining: usize },

    #[error("unknown {context} tag {tag:#04x}")]
    UnknownFieldTag { context: &'static str, tag: u8 },

    #[error("varint overflows target integer width")]
    VarintOverflow,

    #[error("non-canonical varint encoding")]
    NonCanonicalVarint,

    #[error("{0} trailing bytes after object")]
    TrailingBytes(usize),

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u64),

    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("object does not re-encode to its input bytes")]
    NonCanonicalEncoding,
}

impl CodecError {
    /// True when the input simply ran out, either mid-read or at a length check.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            CodecError::TruncatedInput { .. } | CodecError::MalformedLength { .. }
        )
    }
}

/// Errors produced while deriving or checking hashes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("tree hash of an empty list")]
    EmptyTree,

    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: Hash, actual: Hash },

    #[error("serialization failed: {0}")]
    Codec(#[from] CodecError),
}
