//! The tx_extra tagged-field stream.
//!
//! A transaction's `extra` is a flat concatenation of records, each a tag
//! byte followed by that kind's payload. [`parse_tx_extra`] splits a buffer
//! into [`TxExtraField`]s and fails on any tag it does not know; nothing is
//! skipped silently.
//!
//! | tag    | record             | payload                                  |
//! |--------|--------------------|------------------------------------------|
//! | `0x00` | padding            | zero bytes up to the end of the stream   |
//! | `0x01` | public key         | 32 raw bytes                             |
//! | `0x02` | nonce              | length-prefixed bytes, at most 255       |
//! | `0x03` | merge-mining tag   | length-prefixed `varint(depth) ++ root`  |
//! | `0xDE` | minergate          | length-prefixed bytes                    |

use serde::{Deserialize, Serialize};

use cryptonote_format_core::{BinaryCodec, BinaryReader, BinaryWriter, CodecError, Hash, PublicKey};

pub const TX_EXTRA_PADDING_MAX_COUNT: usize = 255;
pub const TX_EXTRA_NONCE_MAX_COUNT: usize = 255;

pub const TX_EXTRA_TAG_PADDING: u8 = 0x00;
pub const TX_EXTRA_TAG_PUBKEY: u8 = 0x01;
pub const TX_EXTRA_NONCE: u8 = 0x02;
pub const TX_EXTRA_MERGE_MINING_TAG: u8 = 0x03;
pub const TX_EXTRA_MYSTERIOUS_MINERGATE_TAG: u8 = 0xDE;

/// Deepest auxiliary-chain tree a merge-mining tag may describe.
pub const MAX_MERGE_MINING_DEPTH: u64 = 8 * Hash::LEN as u64;

/// A run of zero bytes. `size` counts the tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxExtraPadding {
    pub size: usize,
}

/// Free-form miner data, at most [`TX_EXTRA_NONCE_MAX_COUNT`] bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxExtraNonce(pub Vec<u8>);

/// Opaque record written by some pool software.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxExtraMinergate(pub Vec<u8>);

/// Commitment to an auxiliary chain's Merkle root, used in merged mining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMiningTag {
    pub depth: u64,
    pub merkle_root: Hash,
}

impl BinaryCodec for MergeMiningTag {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        let mut inner = BinaryWriter::with_capacity(1 + Hash::LEN);
        inner.write_varint(self.depth);
        self.merkle_root.encode(&mut inner)?;
        w.write_string(&inner.into_blob());
        Ok(())
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let body = r.read_string()?;
        let mut inner = BinaryReader::new(&body);
        // Bytes after the root inside the body are ignored.
        let tag = inner.read_varint().and_then(|depth| {
            Ok(Self {
                depth,
                merkle_root: Hash::decode(&mut inner)?,
            })
        });
        tag.map_err(|err| r.fail(err))
    }
}

/// One tx_extra record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxExtraField {
    Padding(TxExtraPadding),
    PubKey(PublicKey),
    Nonce(TxExtraNonce),
    MergeMiningTag(MergeMiningTag),
    Minergate(TxExtraMinergate),
}

impl TxExtraField {
    /// The tag byte this record is written with.
    pub fn tag(&self) -> u8 {
        match self {
            TxExtraField::Padding(_) => TX_EXTRA_TAG_PADDING,
            TxExtraField::PubKey(_) => TX_EXTRA_TAG_PUBKEY,
            TxExtraField::Nonce(_) => TX_EXTRA_NONCE,
            TxExtraField::MergeMiningTag(_) => TX_EXTRA_MERGE_MINING_TAG,
            TxExtraField::Minergate(_) => TX_EXTRA_MYSTERIOUS_MINERGATE_TAG,
        }
    }
}

fn decode_padding(r: &mut BinaryReader<'_>) -> Result<TxExtraPadding, CodecError> {
    let mut size = 1;
    while !r.is_empty() {
        if size >= TX_EXTRA_PADDING_MAX_COUNT {
            return Err(r.fail(CodecError::InvalidField(format!(
                "padding longer than {TX_EXTRA_PADDING_MAX_COUNT} bytes"
            ))));
        }
        let byte = r.read_u8()?;
        if byte != 0 {
            return Err(r.fail(CodecError::InvalidField(format!(
                "nonzero padding byte {byte:#04x}"
            ))));
        }
        size += 1;
    }
    Ok(TxExtraPadding { size })
}

impl BinaryCodec for TxExtraField {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        match self {
            TxExtraField::Padding(padding) => {
                if padding.size == 0 || padding.size > TX_EXTRA_PADDING_MAX_COUNT {
                    return Err(CodecError::InvalidField(format!(
                        "padding size {} outside 1..={TX_EXTRA_PADDING_MAX_COUNT}",
                        padding.size
                    )));
                }
                w.write_u8(TX_EXTRA_TAG_PADDING);
                w.write_blob(&vec![0u8; padding.size - 1]);
            }
            TxExtraField::PubKey(key) => {
                w.write_u8(TX_EXTRA_TAG_PUBKEY);
                key.encode(w)?;
            }
            TxExtraField::Nonce(nonce) => {
                if nonce.0.len() > TX_EXTRA_NONCE_MAX_COUNT {
                    return Err(CodecError::InvalidField(format!(
                        "nonce of {} bytes exceeds {TX_EXTRA_NONCE_MAX_COUNT}",
                        nonce.0.len()
                    )));
                }
                w.write_u8(TX_EXTRA_NONCE);
                w.write_string(&nonce.0);
            }
            TxExtraField::MergeMiningTag(tag) => {
                w.write_u8(TX_EXTRA_MERGE_MINING_TAG);
                tag.encode(w)?;
            }
            TxExtraField::Minergate(data) => {
                w.write_u8(TX_EXTRA_MYSTERIOUS_MINERGATE_TAG);
                w.write_string(&data.0);
            }
        }
        Ok(())
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        match r.read_u8()? {
            TX_EXTRA_TAG_PADDING => Ok(TxExtraField::Padding(decode_padding(r)?)),
            TX_EXTRA_TAG_PUBKEY => Ok(TxExtraField::PubKey(PublicKey::decode(r)?)),
            TX_EXTRA_NONCE => {
                let nonce = r.read_string()?;
                if nonce.len() > TX_EXTRA_NONCE_MAX_COUNT {
                    return Err(r.fail(CodecError::InvalidField(format!(
                        "nonce of {} bytes exceeds {TX_EXTRA_NONCE_MAX_COUNT}",
                        nonce.len()
                    ))));
                }
                Ok(TxExtraField::Nonce(TxExtraNonce(nonce)))
            }
            TX_EXTRA_MERGE_MINING_TAG => {
                Ok(TxExtraField::MergeMiningTag(MergeMiningTag::decode(r)?))
            }
            TX_EXTRA_MYSTERIOUS_MINERGATE_TAG => {
                Ok(TxExtraField::Minergate(TxExtraMinergate(r.read_string()?)))
            }
            tag => Err(r.fail(CodecError::UnknownFieldTag {
                context: "tx_extra",
                tag,
            })),
        }
    }
}

/// Split `extra` into its records, in order.
///
/// An empty buffer has no records. Any malformed or unknown record fails the
/// whole parse.
pub fn parse_tx_extra(extra: &[u8]) -> Result<Vec<TxExtraField>, CodecError> {
    let mut r = BinaryReader::new(extra);
    let mut fields = Vec::new();
    while !r.is_empty() {
        fields.push(TxExtraField::decode(&mut r)?);
    }
    Ok(fields)
}

/// Concatenate `fields` back into an extra buffer.
pub fn serialize_tx_extra(fields: &[TxExtraField]) -> Result<Vec<u8>, CodecError> {
    let mut w = BinaryWriter::new();
    for field in fields {
        field.encode(&mut w)?;
    }
    Ok(w.into_blob())
}

/// A record kind that can be picked out of a parsed field list.
pub trait ExtraFieldKind: Sized {
    /// This kind's payload, if `field` is of this kind.
    fn from_field(field: &TxExtraField) -> Option<Self>;
}

impl ExtraFieldKind for TxExtraPadding {
    fn from_field(field: &TxExtraField) -> Option<Self> {
        match field {
            TxExtraField::Padding(padding) => Some(*padding),
            _ => None,
        }
    }
}

impl ExtraFieldKind for PublicKey {
    fn from_field(field: &TxExtraField) -> Option<Self> {
        match field {
            TxExtraField::PubKey(key) => Some(*key),
            _ => None,
        }
    }
}

impl ExtraFieldKind for TxExtraNonce {
    fn from_field(field: &TxExtraField) -> Option<Self> {
        match field {
            TxExtraField::Nonce(nonce) => Some(nonce.clone()),
            _ => None,
        }
    }
}

impl ExtraFieldKind for MergeMiningTag {
    fn from_field(field: &TxExtraField) -> Option<Self> {
        match field {
            TxExtraField::MergeMiningTag(tag) => Some(*tag),
            _ => None,
        }
    }
}

impl ExtraFieldKind for TxExtraMinergate {
    fn from_field(field: &TxExtraField) -> Option<Self> {
        match field {
            TxExtraField::Minergate(data) => Some(data.clone()),
            _ => None,
        }
    }
}

/// First record of kind `T` in `fields`.
pub fn find_field<T: ExtraFieldKind>(fields: &[TxExtraField]) -> Option<T> {
    fields.iter().find_map(T::from_field)
}

/// Append a merge-mining tag record to `extra`.
pub fn append_mm_tag_to_extra(extra: &mut Vec<u8>, tag: &MergeMiningTag) -> Result<(), CodecError> {
    let mut w = BinaryWriter::new();
    TxExtraField::MergeMiningTag(*tag).encode(&mut w)?;
    extra.extend_from_slice(&w.into_blob());
    Ok(())
}

/// The first merge-mining tag in `extra`, if any.
pub fn get_mm_tag_from_extra(extra: &[u8]) -> Result<Option<MergeMiningTag>, CodecError> {
    Ok(find_field(&parse_tx_extra(extra)?))
}

/// Append a transaction public key record to `extra`.
pub fn append_tx_pub_key_to_extra(extra: &mut Vec<u8>, key: &PublicKey) {
    extra.push(TX_EXTRA_TAG_PUBKEY);
    extra.extend_from_slice(key.as_bytes());
}

/// The first transaction public key in `extra`, if any.
pub fn tx_pub_key_from_extra(extra: &[u8]) -> Result<Option<PublicKey>, CodecError> {
    Ok(find_field(&parse_tx_extra(extra)?))
}

/// Append a nonce record to `extra`.
pub fn append_nonce_to_extra(extra: &mut Vec<u8>, nonce: &[u8]) -> Result<(), CodecError> {
    let mut w = BinaryWriter::new();
    TxExtraField::Nonce(TxExtraNonce(nonce.to_vec())).encode(&mut w)?;
    extra.extend_from_slice(&w.into_blob());
    Ok(())
}
