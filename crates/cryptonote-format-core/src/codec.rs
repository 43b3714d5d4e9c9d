//! Object codec: the canonical blob of a structured value.
//!
//! A type takes part in the format by implementing [`BinaryCodec`] once for
//! each direction. Encoding walks the fields in a fixed order and decoding
//! walks them in the same order. The blob produced by [`to_blob`] is the single
//! byte representation used for storage, transport and hashing.

use crate::archive::{BinaryReader, BinaryWriter};
use crate::crypto::cn_fast_hash;
use crate::error::CodecError;
use crate::types::{Hash, Signature};

/// Encode to and decode from the binary archive.
pub trait BinaryCodec: Sized {
    /// Append this value's wire form to `w`.
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError>;

    /// Read one value from `r`.
    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError>;
}

/// Bare `u64`s are varints, which is also how `Vec<u64>` elements go out.
impl BinaryCodec for u64 {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        w.write_varint(*self);
        Ok(())
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        r.read_varint()
    }
}

/// Sequences: `varint(count)` then each element.
impl<T: BinaryCodec> BinaryCodec for Vec<T> {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        w.begin_array(self.len());
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                w.delimit_array();
            }
            item.encode(w)?;
        }
        w.end_array();
        Ok(())
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let count = r.begin_array()?;
        let mut items = Vec::with_capacity(count);
        for i in 0..count {
            if i > 0 {
                r.delimit_array();
            }
            items.push(T::decode(r)?);
        }
        r.end_array();
        Ok(items)
    }
}

/// Serialize `value` to its canonical blob.
pub fn to_blob<T: BinaryCodec>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut w = BinaryWriter::new();
    value.encode(&mut w)?;
    Ok(w.into_blob())
}

/// Parse a value that must occupy the whole of `blob`.
pub fn from_blob<T: BinaryCodec>(blob: &[u8]) -> Result<T, CodecError> {
    let mut r = BinaryReader::new(blob);
    let value = T::decode(&mut r)?;
    r.finish()?;
    Ok(value)
}

/// Hash of the canonical blob of `value`.
pub fn object_hash<T: BinaryCodec>(value: &T) -> Result<Hash, CodecError> {
    object_hash_with_size(value).map(|(hash, _)| hash)
}

/// Hash of the canonical blob of `value`, with the blob's length.
pub fn object_hash_with_size<T: BinaryCodec>(value: &T) -> Result<(Hash, usize), CodecError> {
    let blob = to_blob(value)?;
    Ok((cn_fast_hash(&blob), blob.len()))
}

/// Write a run of signatures.
///
/// There is no count: the reader learns it from the ring size of the input
/// the run belongs to. An empty run writes nothing.
pub fn encode_signatures(w: &mut BinaryWriter, signatures: &[Signature]) {
    for sig in signatures {
        w.write_blob(&sig.0);
    }
}

/// Read a run of exactly `count` signatures.
pub fn decode_signatures(
    r: &mut BinaryReader<'_>,
    count: usize,
) -> Result<Vec<Signature>, CodecError> {
    let remaining = r.remaining_bytes();
    let needed = count.saturating_mul(Signature::LEN);
    if remaining < needed {
        return Err(r.fail(CodecError::TruncatedInput { needed, remaining }));
    }

    let mut signatures = Vec::with_capacity(count);
    for _ in 0..count {
        signatures.push(Signature::decode(r)?);
    }
    Ok(signatures)
}
