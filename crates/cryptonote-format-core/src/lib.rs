//! # CryptoNote Format Core
//!
//! Pure primitives for the CryptoNote binary format: varints, the binary
//! archive, the object codec, fixed-size crypto values and hash primitives.
//!
//! This crate contains no I/O and no logging. It is pure computation over
//! in-memory buffers, and every function is safe to call from any thread.
//!
//! ## Key Types
//!
//! - [`BinaryWriter`] / [`BinaryReader`] - The two halves of the archive
//! - [`BinaryCodec`] - Implemented once per direction by every wire type
//! - [`Hash`], [`PublicKey`], [`KeyImage`], [`Signature`], ... - Raw fixed-size values
//!
//! ## Pipeline
//!
//! object → [`to_blob`] → [`cn_fast_hash`] → [`Hash`]. See [`codec`].

pub mod archive;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod types;
pub mod varint;

pub use archive::{BinaryReader, BinaryWriter};
pub use codec::{
    decode_signatures, encode_signatures, from_blob, object_hash, object_hash_with_size, to_blob,
    BinaryCodec,
};
pub use crypto::{
    cn_fast_hash, tree_branch, tree_depth, tree_hash, tree_hash_from_branch, verify_hash,
    SlowHash,
};
pub use error::{CodecError, HashError};
pub use types::{Chacha8Iv, Hash, KeyDerivation, KeyImage, PublicKey, SecretKey, Signature};
pub use varint::{read_varint, varint_bytes, write_varint};
