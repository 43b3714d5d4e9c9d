//! Golden block vectors for deterministic verification.
//!
//! Each vector describes a block by a handful of parameters. The header
//! encoding is pinned by hand and the block id was computed by a separate
//! Keccak-based model of the hashing protocol.

use serde::Serialize;

use cryptonote_format::{
    append_mm_tag_to_extra, append_tx_pub_key_to_extra, block_hash, block_hashing_blob,
    Block, BlockHeader, LegacyTransaction, MergeMiningTag, ParentBlock, Transaction,
    TransactionPrefix, TxIn, TxOut, TxOutTarget,
};
use cryptonote_format_core::{to_blob, tree_depth, Hash, PublicKey};

/// A golden block vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub major_version: u8,
    pub timestamp: u64,
    pub nonce: u32,
    /// Height recorded in the miner transaction's coinbase input.
    pub height: u64,
    pub reward: u64,
    /// Number of listed (non-miner) transactions.
    pub tx_count: usize,
    /// Parent transaction count and merge-mining depth, for version 2.
    pub parent: Option<(u64, u64)>,
    /// Expected header encoding (hex).
    pub expected_header: &'static str,
    /// Expected block id (hex).
    pub expected_block_id: &'static str,
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "v1 block, miner transaction only",
            major_version: 1,
            timestamp: 0,
            nonce: 70,
            height: 0,
            reward: 1000,
            tx_count: 0,
            parent: None,
            expected_header: "010000\
                0000000000000000000000000000000000000000000000000000000000000000\
                46000000",
            expected_block_id: "cb164f052331b44407b1268320dea69b26f7e2da71817e4d3c90bcc73a621424",
        },
        GoldenVector {
            name: "v1 block with three transactions",
            major_version: 1,
            timestamp: 1_500_000_000,
            nonce: 0xdead_beef,
            height: 350_000,
            reward: 29_000_000,
            tx_count: 3,
            parent: None,
            expected_header: "010080dea0cb05\
                0000000000000000000000000000000000000000000000000000000000000000\
                efbeadde",
            expected_block_id: "08d40ffe2aa0af6b5109ddee6af1c33434a27603d2d3f5cf5aa891dc1480d5c4",
        },
        GoldenVector {
            name: "v2 block merge-mined at depth 3",
            major_version: 2,
            timestamp: 1_600_000_000,
            nonce: 1,
            height: 700_000,
            reward: 29_000_000,
            tx_count: 2,
            parent: Some((5, 3)),
            expected_header: "0200\
                0000000000000000000000000000000000000000000000000000000000000000",
            expected_block_id: "ee4a14b95c049dff96f790073d61a53cbcb2a8cb8008e4230e871383f4204f7f",
        },
    ]
}

fn filler(tag: u8, i: usize) -> Hash {
    let mut bytes = [tag; 32];
    bytes[31] = i as u8;
    Hash::from_bytes(bytes)
}

fn coinbase(height: u64, reward: u64, extra: Vec<u8>) -> TransactionPrefix {
    TransactionPrefix {
        version: 1,
        unlock_time: height + 60,
        inputs: vec![TxIn::Gen { height }],
        outputs: vec![TxOut {
            amount: reward,
            target: TxOutTarget::ToKey {
                key: PublicKey::from_bytes([0x11; 32]),
            },
        }],
        extra,
    }
}

fn parent_from_vector(transaction_count: u64, depth: u64) -> ParentBlock {
    let mut extra = Vec::new();
    append_mm_tag_to_extra(
        &mut extra,
        &MergeMiningTag {
            depth,
            merkle_root: filler(0xa0, 0),
        },
    )
    .expect("merge-mining tag encodes");
    ParentBlock {
        major_version: 1,
        minor_version: 0,
        prev_id: filler(0xb0, 0),
        transaction_count,
        miner_tx_branch: (0..tree_depth(transaction_count as usize))
            .map(|i| filler(0xc0, i))
            .collect(),
        miner_tx: LegacyTransaction {
            prefix: coinbase(1, 50, extra),
            signatures: Vec::new(),
        },
        blockchain_branch: (0..depth as usize).map(|i| filler(0xd0, i)).collect(),
    }
}

/// Build the block a vector describes.
pub fn block_from_vector(vector: &GoldenVector) -> Block {
    let mut extra = Vec::new();
    append_tx_pub_key_to_extra(&mut extra, &PublicKey::from_bytes([0x22; 32]));

    Block {
        header: BlockHeader {
            major_version: vector.major_version,
            minor_version: 0,
            timestamp: vector.timestamp,
            prev_id: Hash::NULL,
            nonce: vector.nonce,
        },
        parent_block: vector
            .parent
            .map(|(count, depth)| parent_from_vector(count, depth)),
        miner_tx: Transaction {
            prefix: coinbase(vector.height, vector.reward, extra),
            signatures: Vec::new(),
        },
        tx_hashes: (0..vector.tx_count).map(|i| filler(0xe0, i)).collect(),
    }
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, block id hex)` per vector. A vector matches when
/// its header encodes as pinned and its id agrees.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let block = block_from_vector(v);
            let header = to_blob(&block.header).map(hex::encode).unwrap_or_default();
            let id = block_hash(&block).map(|h| h.to_hex()).unwrap_or_default();

            let matches = header == v.expected_header && id == v.expected_block_id;

            (v.name.to_string(), matches, id)
        })
        .collect()
}

/// All vectors with their computed hashing blobs, as pretty JSON.
pub fn vectors_json() -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Entry {
        #[serde(flatten)]
        vector: GoldenVector,
        hashing_blob: String,
        block_id: String,
    }

    let entries: Vec<Entry> = all_vectors()
        .into_iter()
        .map(|vector| {
            let block = block_from_vector(&vector);
            Entry {
                hashing_blob: block_hashing_blob(&block).map(hex::encode).unwrap_or_default(),
                block_id: block_hash(&block).map(|h| h.to_hex()).unwrap_or_default(),
                vector,
            }
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}
