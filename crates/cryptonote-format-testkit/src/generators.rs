//! Proptest generators for property-based testing.
//!
//! Every generated object encodes successfully: signature runs match ring
//! sizes, parent blocks carry branches of the lengths their transaction
//! count and merge-mining tag demand.

use proptest::prelude::*;

use cryptonote_format::{
    append_mm_tag_to_extra, Block, BlockHeader, LegacyBlock, LegacyTransaction, MergeMiningTag,
    ParentBlock, Transaction, TransactionPrefix, TxExtraField, TxExtraMinergate, TxExtraNonce,
    TxExtraPadding, TxIn, TxOut, TxOutTarget, TxOutToScript, CURRENT_TRANSACTION_VERSION,
    TX_EXTRA_NONCE_MAX_COUNT, TX_EXTRA_PADDING_MAX_COUNT,
};
use cryptonote_format_core::{tree_depth, Hash, KeyImage, PublicKey, Signature};

/// Generate a random Hash.
pub fn hash() -> impl Strategy<Value = Hash> {
    any::<[u8; 32]>().prop_map(Hash::from_bytes)
}

/// Generate a random PublicKey.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    any::<[u8; 32]>().prop_map(PublicKey::from_bytes)
}

/// Generate a random KeyImage.
pub fn key_image() -> impl Strategy<Value = KeyImage> {
    any::<[u8; 32]>().prop_map(KeyImage::from_bytes)
}

/// Generate a random Signature.
pub fn signature() -> impl Strategy<Value = Signature> {
    (any::<[u8; 32]>(), any::<[u8; 32]>()).prop_map(|(c, r)| {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&c);
        bytes[32..].copy_from_slice(&r);
        Signature::from_bytes(bytes)
    })
}

/// Generate byte strings of specified max length.
pub fn bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

pub fn script() -> impl Strategy<Value = TxOutToScript> {
    (prop::collection::vec(public_key(), 0..3), bytes(16))
        .prop_map(|(keys, script)| TxOutToScript { keys, script })
}

/// Generate any transaction input.
pub fn tx_in() -> impl Strategy<Value = TxIn> {
    prop_oneof![
        any::<u64>().prop_map(|height| TxIn::Gen { height }),
        (hash(), any::<u64>(), bytes(16)).prop_map(|(prev, prevout, sigset)| TxIn::ToScript {
            prev,
            prevout,
            sigset
        }),
        (hash(), any::<u64>(), script(), bytes(16)).prop_map(|(prev, prevout, script, sigset)| {
            TxIn::ToScriptHash {
                prev,
                prevout,
                script,
                sigset,
            }
        }),
        (any::<u64>(), prop::collection::vec(any::<u64>(), 1..5), key_image()).prop_map(
            |(amount, key_offsets, key_image)| TxIn::ToKey {
                amount,
                key_offsets,
                key_image
            }
        ),
    ]
}

pub fn tx_out_target() -> impl Strategy<Value = TxOutTarget> {
    prop_oneof![
        script().prop_map(TxOutTarget::ToScript),
        hash().prop_map(|hash| TxOutTarget::ToScriptHash { hash }),
        public_key().prop_map(|key| TxOutTarget::ToKey { key }),
    ]
}

pub fn tx_out() -> impl Strategy<Value = TxOut> {
    (any::<u64>(), tx_out_target()).prop_map(|(amount, target)| TxOut { amount, target })
}

pub fn transaction_prefix() -> impl Strategy<Value = TransactionPrefix> {
    (
        0..=CURRENT_TRANSACTION_VERSION,
        any::<u64>(),
        prop::collection::vec(tx_in(), 0..4),
        prop::collection::vec(tx_out(), 0..4),
        bytes(64),
    )
        .prop_map(|(version, unlock_time, inputs, outputs, extra)| TransactionPrefix {
            version,
            unlock_time,
            inputs,
            outputs,
            extra,
        })
}

/// Signature runs sized to `inputs`, or none when no input expects any.
pub fn signatures_for(inputs: &[TxIn]) -> BoxedStrategy<Vec<Vec<Signature>>> {
    if inputs.iter().all(|input| input.signature_size() == 0) {
        return Just(Vec::new()).boxed();
    }
    inputs
        .iter()
        .map(|input| prop::collection::vec(signature(), input.signature_size()))
        .collect::<Vec<_>>()
        .boxed()
}

pub fn transaction() -> impl Strategy<Value = Transaction> {
    transaction_prefix()
        .prop_flat_map(|prefix| {
            let signatures = signatures_for(&prefix.inputs);
            (Just(prefix), signatures)
        })
        .prop_map(|(prefix, signatures)| Transaction { prefix, signatures })
}

pub fn legacy_transaction() -> impl Strategy<Value = LegacyTransaction> {
    transaction().prop_map(LegacyTransaction::from)
}

/// Generate a tx_extra record other than padding.
pub fn tx_extra_field() -> impl Strategy<Value = TxExtraField> {
    prop_oneof![
        public_key().prop_map(TxExtraField::PubKey),
        bytes(TX_EXTRA_NONCE_MAX_COUNT).prop_map(|n| TxExtraField::Nonce(TxExtraNonce(n))),
        (any::<u64>(), hash()).prop_map(|(depth, merkle_root)| {
            TxExtraField::MergeMiningTag(MergeMiningTag { depth, merkle_root })
        }),
        bytes(32).prop_map(|m| TxExtraField::Minergate(TxExtraMinergate(m))),
    ]
}

/// Generate a well-formed record list. Padding, if any, comes last.
pub fn tx_extra_fields() -> impl Strategy<Value = Vec<TxExtraField>> {
    (
        prop::collection::vec(tx_extra_field(), 0..6),
        prop::option::of(1..=TX_EXTRA_PADDING_MAX_COUNT),
    )
        .prop_map(|(mut fields, padding)| {
            if let Some(size) = padding {
                fields.push(TxExtraField::Padding(TxExtraPadding { size }));
            }
            fields
        })
}

fn parent_miner_tx(height: u64, depth: u64, aux_root: Hash) -> LegacyTransaction {
    let mut extra = Vec::new();
    append_mm_tag_to_extra(
        &mut extra,
        &MergeMiningTag {
            depth,
            merkle_root: aux_root,
        },
    )
    .expect("merge-mining tag encodes");
    LegacyTransaction {
        prefix: TransactionPrefix {
            version: 1,
            unlock_time: height + 60,
            inputs: vec![TxIn::Gen { height }],
            outputs: vec![],
            extra,
        },
        signatures: Vec::new(),
    }
}

/// Generate a parent block whose branches fit its transaction count and
/// merge-mining depth.
pub fn parent_block() -> impl Strategy<Value = ParentBlock> {
    (0u8..=1, any::<u8>(), hash(), 1u64..64, 0u64..6, any::<u32>(), hash())
        .prop_flat_map(|(major, minor, prev_id, count, depth, height, aux_root)| {
            let miner_tx_branch = prop::collection::vec(hash(), tree_depth(count as usize));
            let blockchain_branch = prop::collection::vec(hash(), depth as usize);
            (
                Just((major, minor, prev_id, count, depth, height, aux_root)),
                miner_tx_branch,
                blockchain_branch,
            )
        })
        .prop_map(
            |((major, minor, prev_id, count, depth, height, aux_root), branch, chain)| {
                ParentBlock {
                    major_version: major,
                    minor_version: minor,
                    prev_id,
                    transaction_count: count,
                    miner_tx_branch: branch,
                    miner_tx: parent_miner_tx(height.into(), depth, aux_root),
                    blockchain_branch: chain,
                }
            },
        )
}

/// Parameters for generating a block.
#[derive(Debug, Clone)]
pub struct BlockParams {
    pub major_version: u8,
    pub minor_version: u8,
    pub timestamp: u64,
    pub prev_id: Hash,
    pub nonce: u32,
    /// Used only from major version 2.
    pub parent: ParentBlock,
    pub miner_tx: Transaction,
    pub tx_hashes: Vec<Hash>,
}

impl Arbitrary for BlockParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            1u8..=3, // major version
            any::<u8>(),
            any::<u64>(),
            hash(),
            any::<u32>(),
            parent_block(),
            transaction(),
            prop::collection::vec(hash(), 0..8),
        )
            .prop_map(
                |(major_version, minor_version, timestamp, prev_id, nonce, parent, miner_tx, tx_hashes)| {
                    BlockParams {
                        major_version,
                        minor_version,
                        timestamp,
                        prev_id,
                        nonce,
                        parent,
                        miner_tx,
                        tx_hashes,
                    }
                },
            )
            .boxed()
    }
}

/// Generate a block from parameters.
pub fn block_from_params(params: &BlockParams) -> Block {
    let header = BlockHeader {
        major_version: params.major_version,
        minor_version: params.minor_version,
        timestamp: params.timestamp,
        prev_id: params.prev_id,
        nonce: params.nonce,
    };
    Block {
        header,
        parent_block: header.has_parent_block().then(|| params.parent.clone()),
        miner_tx: params.miner_tx.clone(),
        tx_hashes: params.tx_hashes.clone(),
    }
}

/// Generate a pre-fork block from parameters.
pub fn legacy_block_from_params(params: &BlockParams) -> LegacyBlock {
    LegacyBlock {
        header: BlockHeader {
            major_version: params.major_version,
            minor_version: params.minor_version,
            timestamp: params.timestamp,
            prev_id: params.prev_id,
            nonce: params.nonce,
        },
        miner_tx: params.miner_tx.clone().into(),
        tx_hashes: params.tx_hashes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptonote_format::{
        block_hash, block_header_hash, parse_tx_extra, serialize_tx_extra, ChainFormat,
    };
    use cryptonote_format_core::{from_blob, to_blob};

    proptest! {
        #[test]
        fn test_transaction_roundtrip(tx in transaction()) {
            let blob = to_blob(&tx).unwrap();
            prop_assert_eq!(from_blob::<Transaction>(&blob).unwrap(), tx);
        }

        #[test]
        fn test_legacy_transaction_roundtrip(tx in legacy_transaction()) {
            let blob = to_blob(&tx).unwrap();
            prop_assert_eq!(from_blob::<LegacyTransaction>(&blob).unwrap(), tx);
        }

        #[test]
        fn test_block_roundtrip(params: BlockParams) {
            let block = block_from_params(&params);
            let blob = to_blob(&block).unwrap();
            prop_assert_eq!(from_blob::<Block>(&blob).unwrap(), block);
        }

        #[test]
        fn test_legacy_block_roundtrip(params: BlockParams) {
            let block = legacy_block_from_params(&params);
            let blob = to_blob(&block).unwrap();
            prop_assert_eq!(from_blob::<LegacyBlock>(&blob).unwrap(), block);
        }

        #[test]
        fn test_facade_accepts_generated_blocks(params: BlockParams) {
            let block = block_from_params(&params);
            let blob = to_blob(&block).unwrap();
            let parsed = ChainFormat::default().parse_block(&blob).unwrap();
            prop_assert_eq!(parsed, block);
        }

        #[test]
        fn test_tx_extra_roundtrip(fields in tx_extra_fields()) {
            let extra = serialize_tx_extra(&fields).unwrap();
            prop_assert_eq!(parse_tx_extra(&extra).unwrap(), fields);
        }

        #[test]
        fn test_arbitrary_extra_never_panics(extra in bytes(512)) {
            let _ = parse_tx_extra(&extra);
        }

        #[test]
        fn test_truncated_transaction_fails(tx in transaction(), cut in any::<prop::sample::Index>()) {
            let blob = to_blob(&tx).unwrap();
            let cut = cut.index(blob.len());
            let err = from_blob::<Transaction>(&blob[..cut]).unwrap_err();
            prop_assert!(err.is_truncation(), "{:?}", err);
        }

        #[test]
        fn test_truncated_block_fails(params: BlockParams, cut in any::<prop::sample::Index>()) {
            let blob = to_blob(&block_from_params(&params)).unwrap();
            let cut = cut.index(blob.len());
            let err = from_blob::<Block>(&blob[..cut]).unwrap_err();
            prop_assert!(err.is_truncation(), "{:?}", err);
        }

        #[test]
        fn test_block_hash_legacy_path(params: BlockParams) {
            let block = block_from_params(&params);
            let id = block_hash(&block).unwrap();
            prop_assert_eq!(id, block_hash(&block).unwrap());
            if !block.header.has_parent_block() {
                prop_assert_eq!(id, block_header_hash(&block).unwrap());
            }
        }
    }
}
