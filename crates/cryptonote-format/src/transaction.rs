//! Transactions: prefix, inputs, outputs and ring signatures.
//!
//! Inputs and outputs are closed variant sets, each written as a one-byte tag
//! followed by the variant's fields. Signatures follow the prefix as one
//! count-less run per input whose length is that input's ring size.

use serde::{Deserialize, Serialize};

use cryptonote_format_core::{
    decode_signatures, encode_signatures, BinaryCodec, BinaryReader, BinaryWriter, CodecError,
    Hash, KeyImage, PublicKey, Signature,
};

/// Highest transaction version this format understands.
pub const CURRENT_TRANSACTION_VERSION: u64 = 1;

mod tags {
    pub const TXIN_TO_SCRIPT: u8 = 0x00;
    pub const TXIN_TO_SCRIPTHASH: u8 = 0x01;
    pub const TXIN_TO_KEY: u8 = 0x02;
    pub const TXIN_GEN: u8 = 0xff;

    pub const TXOUT_TO_SCRIPT: u8 = 0x00;
    pub const TXOUT_TO_SCRIPTHASH: u8 = 0x01;
    pub const TXOUT_TO_KEY: u8 = 0x02;
}

/// Script body shared by script outputs and script-hash inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutToScript {
    pub keys: Vec<PublicKey>,
    pub script: Vec<u8>,
}

impl BinaryCodec for TxOutToScript {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        self.keys.encode(w)?;
        w.write_string(&self.script);
        Ok(())
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            keys: BinaryCodec::decode(r)?,
            script: r.read_string()?,
        })
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxIn {
    /// Coinbase input of a miner transaction.
    Gen { height: u64 },
    /// Spend of a script output.
    ToScript {
        prev: Hash,
        prevout: u64,
        sigset: Vec<u8>,
    },
    /// Spend of a script-hash output.
    ToScriptHash {
        prev: Hash,
        prevout: u64,
        script: TxOutToScript,
        sigset: Vec<u8>,
    },
    /// Ring spend of key outputs.
    ToKey {
        amount: u64,
        key_offsets: Vec<u64>,
        key_image: KeyImage,
    },
}

impl TxIn {
    /// Number of signatures this input carries: its ring size for key
    /// inputs, nothing for the others.
    pub fn signature_size(&self) -> usize {
        match self {
            TxIn::ToKey { key_offsets, .. } => key_offsets.len(),
            TxIn::Gen { .. } | TxIn::ToScript { .. } | TxIn::ToScriptHash { .. } => 0,
        }
    }
}

impl BinaryCodec for TxIn {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        match self {
            TxIn::Gen { height } => {
                w.write_u8(tags::TXIN_GEN);
                w.write_varint(*height);
            }
            TxIn::ToScript {
                prev,
                prevout,
                sigset,
            } => {
                w.write_u8(tags::TXIN_TO_SCRIPT);
                prev.encode(w)?;
                w.write_varint(*prevout);
                w.write_string(sigset);
            }
            TxIn::ToScriptHash {
                prev,
                prevout,
                script,
                sigset,
            } => {
                w.write_u8(tags::TXIN_TO_SCRIPTHASH);
                prev.encode(w)?;
                w.write_varint(*prevout);
                script.encode(w)?;
                w.write_string(sigset);
            }
            TxIn::ToKey {
                amount,
                key_offsets,
                key_image,
            } => {
                w.write_u8(tags::TXIN_TO_KEY);
                w.write_varint(*amount);
                key_offsets.encode(w)?;
                key_image.encode(w)?;
            }
        }
        Ok(())
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        match r.read_u8()? {
            tags::TXIN_GEN => Ok(TxIn::Gen {
                height: r.read_varint()?,
            }),
            tags::TXIN_TO_SCRIPT => Ok(TxIn::ToScript {
                prev: Hash::decode(r)?,
                prevout: r.read_varint()?,
                sigset: r.read_string()?,
            }),
            tags::TXIN_TO_SCRIPTHASH => Ok(TxIn::ToScriptHash {
                prev: Hash::decode(r)?,
                prevout: r.read_varint()?,
                script: TxOutToScript::decode(r)?,
                sigset: r.read_string()?,
            }),
            tags::TXIN_TO_KEY => Ok(TxIn::ToKey {
                amount: r.read_varint()?,
                key_offsets: BinaryCodec::decode(r)?,
                key_image: KeyImage::decode(r)?,
            }),
            tag => Err(r.fail(CodecError::UnknownFieldTag {
                context: "input",
                tag,
            })),
        }
    }
}

/// Where an output's amount goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutTarget {
    ToScript(TxOutToScript),
    ToScriptHash { hash: Hash },
    ToKey { key: PublicKey },
}

impl BinaryCodec for TxOutTarget {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        match self {
            TxOutTarget::ToScript(script) => {
                w.write_u8(tags::TXOUT_TO_SCRIPT);
                script.encode(w)
            }
            TxOutTarget::ToScriptHash { hash } => {
                w.write_u8(tags::TXOUT_TO_SCRIPTHASH);
                hash.encode(w)
            }
            TxOutTarget::ToKey { key } => {
                w.write_u8(tags::TXOUT_TO_KEY);
                key.encode(w)
            }
        }
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        match r.read_u8()? {
            tags::TXOUT_TO_SCRIPT => Ok(TxOutTarget::ToScript(TxOutToScript::decode(r)?)),
            tags::TXOUT_TO_SCRIPTHASH => Ok(TxOutTarget::ToScriptHash {
                hash: Hash::decode(r)?,
            }),
            tags::TXOUT_TO_KEY => Ok(TxOutTarget::ToKey {
                key: PublicKey::decode(r)?,
            }),
            tag => Err(r.fail(CodecError::UnknownFieldTag {
                context: "output",
                tag,
            })),
        }
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub amount: u64,
    pub target: TxOutTarget,
}

impl BinaryCodec for TxOut {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        w.write_varint(self.amount);
        self.target.encode(w)
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            amount: r.read_varint()?,
            target: TxOutTarget::decode(r)?,
        })
    }
}

/// Everything in a transaction that precedes the signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPrefix {
    /// Format version, at most [`CURRENT_TRANSACTION_VERSION`].
    pub version: u64,
    /// Block height or timestamp before which outputs are locked.
    pub unlock_time: u64,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    /// Raw tx_extra; see [`crate::tx_extra`] for its record structure.
    pub extra: Vec<u8>,
}

impl BinaryCodec for TransactionPrefix {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        if self.version > CURRENT_TRANSACTION_VERSION {
            return Err(CodecError::UnsupportedVersion(self.version));
        }
        w.write_varint(self.version);
        w.write_varint(self.unlock_time);
        self.inputs.encode(w)?;
        self.outputs.encode(w)?;
        w.write_string(&self.extra);
        Ok(())
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let version = r.read_varint()?;
        if version > CURRENT_TRANSACTION_VERSION {
            return Err(r.fail(CodecError::UnsupportedVersion(version)));
        }
        Ok(Self {
            version,
            unlock_time: r.read_varint()?,
            inputs: BinaryCodec::decode(r)?,
            outputs: BinaryCodec::decode(r)?,
            extra: r.read_string()?,
        })
    }
}

/// Write one signature run per input.
///
/// An empty `signatures` list is accepted only when no input expects any,
/// and writes nothing.
fn encode_input_signatures(
    w: &mut BinaryWriter,
    inputs: &[TxIn],
    signatures: &[Vec<Signature>],
) -> Result<(), CodecError> {
    if signatures.is_empty() {
        if inputs.iter().any(|input| input.signature_size() != 0) {
            return Err(CodecError::InvalidField(
                "signatures missing for key inputs".into(),
            ));
        }
        return Ok(());
    }

    if signatures.len() != inputs.len() {
        return Err(CodecError::InvalidField(format!(
            "{} signature sets for {} inputs",
            signatures.len(),
            inputs.len()
        )));
    }

    for (i, (input, sigs)) in inputs.iter().zip(signatures).enumerate() {
        if sigs.len() != input.signature_size() {
            return Err(CodecError::InvalidField(format!(
                "input {i} has {} signatures, ring size is {}",
                sigs.len(),
                input.signature_size()
            )));
        }
        encode_signatures(w, sigs);
    }
    Ok(())
}

/// Read the signature runs for `inputs`, sized by each input's ring.
fn decode_input_signatures(
    r: &mut BinaryReader<'_>,
    inputs: &[TxIn],
) -> Result<Vec<Vec<Signature>>, CodecError> {
    if inputs.iter().all(|input| input.signature_size() == 0) {
        return Ok(Vec::new());
    }
    inputs
        .iter()
        .map(|input| decode_signatures(r, input.signature_size()))
        .collect()
}

/// A transaction in the current layout. Its hash covers the whole encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub prefix: TransactionPrefix,
    /// One entry per input, or empty when no input expects signatures.
    pub signatures: Vec<Vec<Signature>>,
}

impl BinaryCodec for Transaction {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        self.prefix.encode(w)?;
        encode_input_signatures(w, &self.prefix.inputs, &self.signatures)
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let prefix = TransactionPrefix::decode(r)?;
        let signatures = decode_input_signatures(r, &prefix.inputs)?;
        Ok(Self { prefix, signatures })
    }
}

/// A transaction in the pre-fork layout, as carried by a merge-mined parent
/// block. Same bytes as [`Transaction`]; its hash covers the prefix only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTransaction {
    pub prefix: TransactionPrefix,
    pub signatures: Vec<Vec<Signature>>,
}

impl BinaryCodec for LegacyTransaction {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        self.prefix.encode(w)?;
        encode_input_signatures(w, &self.prefix.inputs, &self.signatures)
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let prefix = TransactionPrefix::decode(r)?;
        let signatures = decode_input_signatures(r, &prefix.inputs)?;
        Ok(Self { prefix, signatures })
    }
}

impl From<Transaction> for LegacyTransaction {
    fn from(tx: Transaction) -> Self {
        Self {
            prefix: tx.prefix,
            signatures: tx.signatures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptonote_format_core::{from_blob, to_blob};

    fn miner_tx() -> Transaction {
        let mut extra = vec![0x01];
        extra.extend_from_slice(&[0x22; 32]);
        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: 10,
                inputs: vec![TxIn::Gen { height: 5 }],
                outputs: vec![TxOut {
                    amount: 1000,
                    target: TxOutTarget::ToKey {
                        key: PublicKey::from_bytes([0x11; 32]),
                    },
                }],
                extra,
            },
            signatures: Vec::new(),
        }
    }

    fn spend_tx(ring_sizes: &[usize]) -> Transaction {
        let inputs = ring_sizes
            .iter()
            .enumerate()
            .map(|(i, &ring)| TxIn::ToKey {
                amount: 50,
                key_offsets: (0..ring as u64).map(|o| o + 1).collect(),
                key_image: KeyImage::from_bytes([i as u8 + 0x30; 32]),
            })
            .collect();
        let signatures = ring_sizes
            .iter()
            .enumerate()
            .map(|(i, &ring)| vec![Signature::from_bytes([i as u8 + 0x40; 64]); ring])
            .collect();
        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: 0,
                inputs,
                outputs: vec![TxOut {
                    amount: 45,
                    target: TxOutTarget::ToKey {
                        key: PublicKey::from_bytes([0x33; 32]),
                    },
                }],
                extra: Vec::new(),
            },
            signatures,
        }
    }

    #[test]
    fn test_miner_tx_bytes() {
        let blob = to_blob(&miner_tx()).unwrap();
        let mut expected = vec![0x01, 0x0a, 0x01, 0xff, 0x05, 0x01, 0xe8, 0x07, 0x02];
        expected.extend_from_slice(&[0x11; 32]);
        expected.push(0x21);
        expected.push(0x01);
        expected.extend_from_slice(&[0x22; 32]);
        assert_eq!(blob, expected);
    }

    #[test]
    fn test_miner_tx_roundtrip() {
        let tx = miner_tx();
        let blob = to_blob(&tx).unwrap();
        assert_eq!(from_blob::<Transaction>(&blob).unwrap(), tx);
    }

    #[test]
    fn test_signatures_follow_prefix_without_counts() {
        let tx = spend_tx(&[2, 1]);
        let prefix_len = to_blob(&tx.prefix).unwrap().len();
        let blob = to_blob(&tx).unwrap();
        assert_eq!(blob.len(), prefix_len + 3 * 64);
        assert_eq!(blob[prefix_len], 0x40);
        assert_eq!(blob[prefix_len + 2 * 64], 0x41);
        assert_eq!(from_blob::<Transaction>(&blob).unwrap(), tx);
    }

    #[test]
    fn test_script_variants_roundtrip() {
        let script = TxOutToScript {
            keys: vec![PublicKey::from_bytes([7; 32])],
            script: vec![1, 2, 3],
        };
        let tx = Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: 0,
                inputs: vec![
                    TxIn::ToScript {
                        prev: Hash::from_bytes([1; 32]),
                        prevout: 3,
                        sigset: vec![9, 9],
                    },
                    TxIn::ToScriptHash {
                        prev: Hash::from_bytes([2; 32]),
                        prevout: 4,
                        script: script.clone(),
                        sigset: vec![],
                    },
                ],
                outputs: vec![
                    TxOut {
                        amount: 1,
                        target: TxOutTarget::ToScript(script),
                    },
                    TxOut {
                        amount: 2,
                        target: TxOutTarget::ToScriptHash {
                            hash: Hash::from_bytes([5; 32]),
                        },
                    },
                ],
                extra: vec![],
            },
            signatures: Vec::new(),
        };
        let blob = to_blob(&tx).unwrap();
        assert_eq!(from_blob::<Transaction>(&blob).unwrap(), tx);
    }

    #[test]
    fn test_missing_signatures_rejected() {
        let mut tx = spend_tx(&[2]);
        tx.signatures.clear();
        assert!(matches!(to_blob(&tx), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_ring_size_mismatch_rejected() {
        let mut tx = spend_tx(&[2]);
        tx.signatures[0].pop();
        assert!(matches!(to_blob(&tx), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_signature_set_count_mismatch_rejected() {
        let mut tx = spend_tx(&[1, 1]);
        tx.signatures.pop();
        assert!(matches!(to_blob(&tx), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_truncated_signatures() {
        let blob = to_blob(&spend_tx(&[3])).unwrap();
        let err = from_blob::<Transaction>(&blob[..blob.len() - 1]).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedInput { .. }));
    }

    #[test]
    fn test_unknown_input_tag() {
        // version, unlock_time, one input with tag 0x07
        let blob = [0x01, 0x00, 0x01, 0x07, 0x00];
        assert_eq!(
            from_blob::<Transaction>(&blob),
            Err(CodecError::UnknownFieldTag {
                context: "input",
                tag: 0x07
            })
        );
    }

    #[test]
    fn test_future_version_rejected() {
        let mut tx = miner_tx();
        tx.prefix.version = 2;
        assert_eq!(to_blob(&tx), Err(CodecError::UnsupportedVersion(2)));
        assert_eq!(
            from_blob::<Transaction>(&[0x02]),
            Err(CodecError::UnsupportedVersion(2))
        );
    }

    #[test]
    fn test_legacy_layout_shares_bytes() {
        let tx = spend_tx(&[1]);
        let legacy = LegacyTransaction::from(tx.clone());
        assert_eq!(to_blob(&legacy).unwrap(), to_blob(&tx).unwrap());
    }
}
