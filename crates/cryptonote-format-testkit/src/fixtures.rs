//! Test fixtures and helpers.
//!
//! Common setup code for integration tests. A fixture owns a seeded RNG so a
//! failing test can be replayed from its seed.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use cryptonote_format::{
    append_mm_tag_to_extra, append_tx_pub_key_to_extra, Block, BlockHeader, LegacyBlock,
    LegacyTransaction, MergeMiningTag, ParentBlock, Transaction, TransactionPrefix, TxIn, TxOut,
    TxOutTarget, BLOCK_MAJOR_VERSION_1,
};
use cryptonote_format_core::{tree_depth, Hash, KeyImage, PublicKey, Signature};

/// A test fixture with a deterministic random source.
pub struct TestFixture {
    rng: StdRng,
}

impl TestFixture {
    /// Create a new test fixture seeded from the OS.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create with a deterministic seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn hash(&mut self) -> Hash {
        Hash::from_bytes(self.rng.gen())
    }

    pub fn public_key(&mut self) -> PublicKey {
        PublicKey::from_bytes(self.rng.gen())
    }

    pub fn key_image(&mut self) -> KeyImage {
        KeyImage::from_bytes(self.rng.gen())
    }

    pub fn signature(&mut self) -> Signature {
        let mut bytes = [0u8; 64];
        self.rng.fill_bytes(&mut bytes);
        Signature::from_bytes(bytes)
    }

    /// Create a coinbase transaction paying `reward` at `height`.
    pub fn make_miner_tx(&mut self, height: u64, reward: u64) -> Transaction {
        let mut extra = Vec::new();
        let tx_key = self.public_key();
        append_tx_pub_key_to_extra(&mut extra, &tx_key);
        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: height + 60,
                inputs: vec![TxIn::Gen { height }],
                outputs: vec![TxOut {
                    amount: reward,
                    target: TxOutTarget::ToKey {
                        key: self.public_key(),
                    },
                }],
                extra,
            },
            signatures: Vec::new(),
        }
    }

    /// Create a ring spend with one key input per entry of `ring_sizes`.
    pub fn make_spend_tx(&mut self, ring_sizes: &[usize]) -> Transaction {
        let mut inputs = Vec::with_capacity(ring_sizes.len());
        let mut signatures = Vec::with_capacity(ring_sizes.len());
        for &ring in ring_sizes {
            inputs.push(TxIn::ToKey {
                amount: self.rng.gen_range(1..1_000_000),
                key_offsets: (0..ring).map(|_| self.rng.gen_range(0..10_000)).collect(),
                key_image: self.key_image(),
            });
            signatures.push((0..ring).map(|_| self.signature()).collect());
        }
        // No signatures at all when every ring is empty.
        if ring_sizes.iter().all(|&ring| ring == 0) {
            signatures.clear();
        }

        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: 0,
                inputs,
                outputs: vec![TxOut {
                    amount: self.rng.gen_range(1..1_000_000),
                    target: TxOutTarget::ToKey {
                        key: self.public_key(),
                    },
                }],
                extra: Vec::new(),
            },
            signatures,
        }
    }

    /// Create a parent block with branches sized for `transaction_count`
    /// and `mm_depth`.
    pub fn make_parent_block(&mut self, transaction_count: u64, mm_depth: u64) -> ParentBlock {
        let mut extra = Vec::new();
        let tag = MergeMiningTag {
            depth: mm_depth,
            merkle_root: self.hash(),
        };
        append_mm_tag_to_extra(&mut extra, &tag).expect("merge-mining tag encodes");

        let mut miner_tx = LegacyTransaction::from(self.make_miner_tx(1_000, 50));
        miner_tx.prefix.extra = extra;

        ParentBlock {
            major_version: BLOCK_MAJOR_VERSION_1,
            minor_version: 0,
            prev_id: self.hash(),
            transaction_count,
            miner_tx_branch: (0..tree_depth(transaction_count as usize))
                .map(|_| self.hash())
                .collect(),
            miner_tx,
            blockchain_branch: (0..mm_depth).map(|_| self.hash()).collect(),
        }
    }

    fn make_header(&mut self, major_version: u8) -> BlockHeader {
        BlockHeader {
            major_version,
            minor_version: 0,
            timestamp: self.rng.gen_range(1_400_000_000..1_800_000_000),
            prev_id: self.hash(),
            nonce: self.rng.gen(),
        }
    }

    /// Create a block listing `tx_count` transactions. From major version 2
    /// the block carries a parent block.
    pub fn make_block(&mut self, major_version: u8, tx_count: usize) -> Block {
        let header = self.make_header(major_version);
        let parent_block = header
            .has_parent_block()
            .then(|| self.make_parent_block(4, 2));
        let height = self.rng.gen_range(1..1_000_000);
        Block {
            header,
            parent_block,
            miner_tx: self.make_miner_tx(height, 29_000_000),
            tx_hashes: (0..tx_count).map(|_| self.hash()).collect(),
        }
    }

    /// Create a pre-fork block listing `tx_count` transactions.
    pub fn make_legacy_block(&mut self, tx_count: usize) -> LegacyBlock {
        let header = self.make_header(BLOCK_MAJOR_VERSION_1);
        let height = self.rng.gen_range(1..1_000_000);
        LegacyBlock {
            header,
            miner_tx: self.make_miner_tx(height, 29_000_000).into(),
            tx_hashes: (0..tx_count).map(|_| self.hash()).collect(),
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create fixtures with seeds `0..count`.
pub fn seeded_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count as u64).map(TestFixture::with_seed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptonote_format::{
        block_from_blob, block_hash, block_to_blob, legacy_block_hash, transaction_hash,
        tx_pub_key_from_extra, ChainFormat, BLOCK_MAJOR_VERSION_2,
    };
    use cryptonote_format_core::{from_blob, to_blob};

    #[test]
    fn test_seeded_fixture_is_deterministic() {
        let b1 = TestFixture::with_seed(7).make_block(BLOCK_MAJOR_VERSION_2, 3);
        let b2 = TestFixture::with_seed(7).make_block(BLOCK_MAJOR_VERSION_2, 3);
        assert_eq!(b1, b2);
        assert_eq!(block_hash(&b1).unwrap(), block_hash(&b2).unwrap());
    }

    #[test]
    fn test_fixture_blocks_roundtrip() {
        let mut fixture = TestFixture::new();
        for major_version in [1, 2, 3] {
            let block = fixture.make_block(major_version, 5);
            let blob = block_to_blob(&block).unwrap();
            assert_eq!(block_from_blob(&blob).unwrap(), block);
        }
    }

    #[test]
    fn test_fixture_spend_tx() {
        let mut fixture = TestFixture::with_seed(1);
        let tx = fixture.make_spend_tx(&[3, 1]);
        assert_eq!(tx.signatures.len(), 2);
        assert_eq!(tx.signatures[0].len(), 3);

        let format = ChainFormat::default();
        let blob = to_blob(&tx).unwrap();
        let parsed = format.parse_transaction(&blob).unwrap();
        assert_eq!(format.transaction_id(&parsed).unwrap(), transaction_hash(&tx).unwrap());

        let unsigned = fixture.make_spend_tx(&[0]);
        assert!(unsigned.signatures.is_empty());
        let blob = to_blob(&unsigned).unwrap();
        assert_eq!(from_blob::<Transaction>(&blob).unwrap(), unsigned);
    }

    #[test]
    fn test_miner_tx_carries_pub_key() {
        let tx = TestFixture::with_seed(2).make_miner_tx(10, 100);
        assert!(tx_pub_key_from_extra(&tx.prefix.extra).unwrap().is_some());
    }

    #[test]
    fn test_legacy_block_hash() {
        let block = TestFixture::with_seed(3).make_legacy_block(2);
        let blob = to_blob(&block).unwrap();
        let parsed = ChainFormat::default().parse_legacy_block(&blob).unwrap();
        assert_eq!(legacy_block_hash(&parsed).unwrap(), legacy_block_hash(&block).unwrap());
    }

    #[test]
    fn test_seeded_fixtures_differ() {
        let mut fixtures = seeded_fixtures(3);
        let hashes: Vec<_> = fixtures.iter_mut().map(|f| f.hash()).collect();
        assert_ne!(hashes[0], hashes[1]);
        assert_ne!(hashes[1], hashes[2]);
    }
}
