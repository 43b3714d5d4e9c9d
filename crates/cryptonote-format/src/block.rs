//! Blocks, their headers, and the merge-mined parent block.
//!
//! From major version 2 on, a block carries the header of the parent chain
//! block it was merge-mined in. The block's own header then shrinks to the
//! versions and `prev_id`; `timestamp` and `nonce` are written inside the
//! parent section, in the pre-fork layout.
//!
//! ## Key Types
//!
//! - [`BlockHeader`] - Version-dependent header
//! - [`Block`] - Current block, optionally carrying a [`ParentBlock`]
//! - [`ParentBlockView`] - The parent section as serialized, with its flags
//! - [`LegacyBlock`] - Pre-fork block layout
//! - [`BlockView`] - Either layout, as seen by the hashing protocol

use serde::{Deserialize, Serialize};

use cryptonote_format_core::{
    to_blob, tree_depth, tree_hash_from_branch, BinaryCodec, BinaryReader, BinaryWriter,
    CodecError, Hash,
};

use crate::hashing::{legacy_transaction_hash, transaction_hash};
use crate::transaction::{LegacyTransaction, Transaction};
use crate::tx_extra::{get_mm_tag_from_extra, MAX_MERGE_MINING_DEPTH};

pub const BLOCK_MAJOR_VERSION_1: u8 = 1;
pub const BLOCK_MAJOR_VERSION_2: u8 = 2;
pub const BLOCK_MINOR_VERSION_0: u8 = 0;

/// Block header.
///
/// `timestamp` and `nonce` are always present in memory. On the wire they
/// belong to the header only below major version 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub major_version: u8,
    pub minor_version: u8,
    pub timestamp: u64,
    pub prev_id: Hash,
    pub nonce: u32,
}

impl BlockHeader {
    /// Whether blocks with this header carry a merge-mined parent block.
    pub fn has_parent_block(&self) -> bool {
        self.major_version >= BLOCK_MAJOR_VERSION_2
    }
}

fn write_header_v1(w: &mut BinaryWriter, header: &BlockHeader) -> Result<(), CodecError> {
    w.write_varint(header.major_version.into());
    w.write_varint(header.minor_version.into());
    w.write_varint(header.timestamp);
    header.prev_id.encode(w)?;
    w.write_u32_le(header.nonce);
    Ok(())
}

fn read_header_v1(
    r: &mut BinaryReader<'_>,
    major_version: u8,
    minor_version: u8,
) -> Result<BlockHeader, CodecError> {
    Ok(BlockHeader {
        major_version,
        minor_version,
        timestamp: r.read_varint()?,
        prev_id: Hash::decode(r)?,
        nonce: r.read_u32_le()?,
    })
}

impl BinaryCodec for BlockHeader {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        if !self.has_parent_block() {
            return write_header_v1(w, self);
        }
        w.write_varint(self.major_version.into());
        w.write_varint(self.minor_version.into());
        self.prev_id.encode(w)
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let major_version = r.read_varint_as::<u8>()?;
        let minor_version = r.read_varint_as::<u8>()?;
        if major_version < BLOCK_MAJOR_VERSION_2 {
            return read_header_v1(r, major_version, minor_version);
        }
        Ok(Self {
            major_version,
            minor_version,
            timestamp: 0,
            prev_id: Hash::decode(r)?,
            nonce: 0,
        })
    }
}

/// The parent chain block a version 2 block was merge-mined in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentBlock {
    /// At most [`BLOCK_MAJOR_VERSION_1`].
    pub major_version: u8,
    pub minor_version: u8,
    pub prev_id: Hash,
    /// Transactions in the parent block, miner transaction included.
    pub transaction_count: u64,
    /// Branch of the miner transaction in the parent's transaction tree.
    pub miner_tx_branch: Vec<Hash>,
    pub miner_tx: LegacyTransaction,
    /// Branch of this chain in the auxiliary-chain tree committed to by
    /// the merge-mining tag in `miner_tx`.
    pub blockchain_branch: Vec<Hash>,
}

impl ParentBlock {
    /// Root of the parent block's transaction tree.
    pub fn merkle_root(&self) -> Result<Hash, CodecError> {
        let miner_tx_hash = legacy_transaction_hash(&self.miner_tx)?;
        Ok(tree_hash_from_branch(&self.miner_tx_branch, &miner_tx_hash))
    }
}

fn miner_tx_branch_len(transaction_count: u64) -> Result<usize, CodecError> {
    if transaction_count == 0 {
        return Err(CodecError::InvalidField(
            "parent block has no transactions".into(),
        ));
    }
    let count = usize::try_from(transaction_count).map_err(|_| {
        CodecError::InvalidField(format!("parent transaction count {transaction_count}"))
    })?;
    Ok(tree_depth(count))
}

/// Depth of the merge-mining tag in a parent miner transaction's extra.
fn blockchain_branch_len(miner_tx: &LegacyTransaction) -> Result<usize, CodecError> {
    let tag = get_mm_tag_from_extra(&miner_tx.prefix.extra)?.ok_or_else(|| {
        CodecError::InvalidField("parent miner transaction has no merge-mining tag".into())
    })?;
    if tag.depth > MAX_MERGE_MINING_DEPTH {
        return Err(CodecError::InvalidField(format!(
            "merge-mining depth {} exceeds {MAX_MERGE_MINING_DEPTH}",
            tag.depth
        )));
    }
    // Bounded by MAX_MERGE_MINING_DEPTH.
    Ok(tag.depth as usize)
}

/// A [`ParentBlock`] together with the fields it borrows from the block
/// that carries it, ready to be serialized.
///
/// - `hashing` inserts the parent's transaction-tree root after the nonce.
/// - `header_only` stops after the transaction count.
#[derive(Debug, Clone, Copy)]
pub struct ParentBlockView<'a> {
    pub parent: &'a ParentBlock,
    pub timestamp: u64,
    pub nonce: u32,
    pub hashing: bool,
    pub header_only: bool,
}

impl<'a> ParentBlockView<'a> {
    /// View of `block`'s parent section. Fails if the block has none.
    pub fn of(block: &'a Block, hashing: bool, header_only: bool) -> Result<Self, CodecError> {
        let parent = block.parent_block.as_ref().ok_or_else(|| {
            CodecError::InvalidField("block has no parent block".into())
        })?;
        Ok(Self {
            parent,
            timestamp: block.header.timestamp,
            nonce: block.header.nonce,
            hashing,
            header_only,
        })
    }

    /// Append the parent section as the flags select.
    pub fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        let parent = self.parent;
        if parent.major_version > BLOCK_MAJOR_VERSION_1 {
            return Err(CodecError::UnsupportedVersion(parent.major_version.into()));
        }
        w.write_varint(parent.major_version.into());
        w.write_varint(parent.minor_version.into());
        w.write_varint(self.timestamp);
        parent.prev_id.encode(w)?;
        w.write_u32_le(self.nonce);

        if self.hashing {
            parent.merkle_root()?.encode(w)?;
        }

        let branch_len = miner_tx_branch_len(parent.transaction_count)?;
        w.write_varint(parent.transaction_count);
        if self.header_only {
            return Ok(());
        }

        if parent.miner_tx_branch.len() != branch_len {
            return Err(CodecError::InvalidField(format!(
                "miner transaction branch has {} hashes, expected {branch_len}",
                parent.miner_tx_branch.len()
            )));
        }
        for hash in &parent.miner_tx_branch {
            hash.encode(w)?;
        }

        parent.miner_tx.encode(w)?;

        let chain_len = blockchain_branch_len(&parent.miner_tx)?;
        if parent.blockchain_branch.len() != chain_len {
            return Err(CodecError::InvalidField(format!(
                "blockchain branch has {} hashes, merge-mining depth is {chain_len}",
                parent.blockchain_branch.len()
            )));
        }
        for hash in &parent.blockchain_branch {
            hash.encode(w)?;
        }
        Ok(())
    }

    /// Serialize the view on its own.
    pub fn to_blob(&self) -> Result<Vec<u8>, CodecError> {
        let mut w = BinaryWriter::new();
        self.encode(&mut w)?;
        Ok(w.into_blob())
    }
}

fn read_hashes(r: &mut BinaryReader<'_>, count: usize) -> Result<Vec<Hash>, CodecError> {
    (0..count).map(|_| Hash::decode(r)).collect()
}

/// Read a full (non-hashing) parent section. Returns the parent together
/// with the timestamp and nonce it carries for the enclosing block.
fn decode_parent_block(r: &mut BinaryReader<'_>) -> Result<(ParentBlock, u64, u32), CodecError> {
    let major_version = r.read_varint_as::<u8>()?;
    if major_version > BLOCK_MAJOR_VERSION_1 {
        return Err(r.fail(CodecError::UnsupportedVersion(major_version.into())));
    }
    let minor_version = r.read_varint_as::<u8>()?;
    let timestamp = r.read_varint()?;
    let prev_id = Hash::decode(r)?;
    let nonce = r.read_u32_le()?;

    let transaction_count = r.read_varint()?;
    let branch_len = miner_tx_branch_len(transaction_count).map_err(|err| r.fail(err))?;
    let miner_tx_branch = read_hashes(r, branch_len)?;

    let miner_tx = LegacyTransaction::decode(r)?;
    let chain_len = blockchain_branch_len(&miner_tx).map_err(|err| r.fail(err))?;
    let blockchain_branch = read_hashes(r, chain_len)?;

    let parent = ParentBlock {
        major_version,
        minor_version,
        prev_id,
        transaction_count,
        miner_tx_branch,
        miner_tx,
        blockchain_branch,
    };
    Ok((parent, timestamp, nonce))
}

/// A block in the current layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    /// Present exactly when `header.major_version >= 2`.
    pub parent_block: Option<ParentBlock>,
    pub miner_tx: Transaction,
    pub tx_hashes: Vec<Hash>,
}

impl BinaryCodec for Block {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        self.header.encode(w)?;
        if self.header.has_parent_block() {
            ParentBlockView::of(self, false, false)?.encode(w)?;
        } else if self.parent_block.is_some() {
            return Err(CodecError::InvalidField(format!(
                "version {} block cannot carry a parent block",
                self.header.major_version
            )));
        }
        self.miner_tx.encode(w)?;
        self.tx_hashes.encode(w)
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let mut header = BlockHeader::decode(r)?;
        let parent_block = if header.has_parent_block() {
            let (parent, timestamp, nonce) = decode_parent_block(r)?;
            header.timestamp = timestamp;
            header.nonce = nonce;
            Some(parent)
        } else {
            None
        };
        Ok(Self {
            header,
            parent_block,
            miner_tx: Transaction::decode(r)?,
            tx_hashes: BinaryCodec::decode(r)?,
        })
    }
}

/// A block in the pre-fork layout: version 1 header fields whatever the
/// version, and a [`LegacyTransaction`] as miner transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyBlock {
    pub header: BlockHeader,
    pub miner_tx: LegacyTransaction,
    pub tx_hashes: Vec<Hash>,
}

impl LegacyBlock {
    /// The header in its pre-fork wire form.
    pub fn header_blob(&self) -> Result<Vec<u8>, CodecError> {
        let mut w = BinaryWriter::new();
        write_header_v1(&mut w, &self.header)?;
        Ok(w.into_blob())
    }
}

impl BinaryCodec for LegacyBlock {
    fn encode(&self, w: &mut BinaryWriter) -> Result<(), CodecError> {
        write_header_v1(w, &self.header)?;
        self.miner_tx.encode(w)?;
        self.tx_hashes.encode(w)
    }

    fn decode(r: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let major_version = r.read_varint_as::<u8>()?;
        let minor_version = r.read_varint_as::<u8>()?;
        Ok(Self {
            header: read_header_v1(r, major_version, minor_version)?,
            miner_tx: LegacyTransaction::decode(r)?,
            tx_hashes: BinaryCodec::decode(r)?,
        })
    }
}

/// Either block layout, as consumed by the hashing protocol.
#[derive(Debug, Clone, Copy)]
pub enum BlockView<'a> {
    Current(&'a Block),
    Legacy(&'a LegacyBlock),
}

impl<'a> BlockView<'a> {
    pub fn header(&self) -> &'a BlockHeader {
        match self {
            BlockView::Current(block) => &block.header,
            BlockView::Legacy(block) => &block.header,
        }
    }

    /// The header as it opens the hashing blob.
    pub fn header_blob(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            BlockView::Current(block) => to_blob(&block.header),
            BlockView::Legacy(block) => block.header_blob(),
        }
    }

    /// Hash of the miner transaction under this layout's hashing rule.
    pub fn miner_tx_hash(&self) -> Result<Hash, CodecError> {
        match self {
            BlockView::Current(block) => transaction_hash(&block.miner_tx),
            BlockView::Legacy(block) => legacy_transaction_hash(&block.miner_tx),
        }
    }

    pub fn tx_hashes(&self) -> &'a [Hash] {
        match self {
            BlockView::Current(block) => &block.tx_hashes,
            BlockView::Legacy(block) => &block.tx_hashes,
        }
    }
}

impl<'a> From<&'a Block> for BlockView<'a> {
    fn from(block: &'a Block) -> Self {
        BlockView::Current(block)
    }
}

impl<'a> From<&'a LegacyBlock> for BlockView<'a> {
    fn from(block: &'a LegacyBlock) -> Self {
        BlockView::Legacy(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{TransactionPrefix, TxIn, TxOut, TxOutTarget};
    use crate::tx_extra::{append_mm_tag_to_extra, MergeMiningTag};
    use cryptonote_format_core::{from_blob, PublicKey};

    fn coinbase(height: u64, extra: Vec<u8>) -> TransactionPrefix {
        TransactionPrefix {
            version: 1,
            unlock_time: height + 10,
            inputs: vec![TxIn::Gen { height }],
            outputs: vec![TxOut {
                amount: 70,
                target: TxOutTarget::ToKey {
                    key: PublicKey::from_bytes([0x11; 32]),
                },
            }],
            extra,
        }
    }

    fn parent(transaction_count: u64, mm_depth: u64) -> ParentBlock {
        let mut extra = Vec::new();
        append_mm_tag_to_extra(
            &mut extra,
            &MergeMiningTag {
                depth: mm_depth,
                merkle_root: Hash::from_bytes([0x55; 32]),
            },
        )
        .unwrap();
        ParentBlock {
            major_version: 1,
            minor_version: 0,
            prev_id: Hash::from_bytes([0x44; 32]),
            transaction_count,
            miner_tx_branch: (0..tree_depth(transaction_count as usize))
                .map(|i| Hash::from_bytes([0x60 + i as u8; 32]))
                .collect(),
            miner_tx: LegacyTransaction {
                prefix: coinbase(900, extra),
                signatures: Vec::new(),
            },
            blockchain_branch: (0..mm_depth)
                .map(|i| Hash::from_bytes([0x80 + i as u8; 32]))
                .collect(),
        }
    }

    fn merged_block(transaction_count: u64, mm_depth: u64) -> Block {
        Block {
            header: BlockHeader {
                major_version: BLOCK_MAJOR_VERSION_2,
                minor_version: 0,
                timestamp: 100,
                prev_id: Hash::from_bytes([0x33; 32]),
                nonce: 0x0102_0304,
            },
            parent_block: Some(parent(transaction_count, mm_depth)),
            miner_tx: Transaction {
                prefix: coinbase(5, Vec::new()),
                signatures: Vec::new(),
            },
            tx_hashes: vec![Hash::from_bytes([0x77; 32])],
        }
    }

    fn v1_block() -> Block {
        Block {
            header: BlockHeader {
                major_version: BLOCK_MAJOR_VERSION_1,
                minor_version: 0,
                timestamp: 300,
                prev_id: Hash::from_bytes([0x33; 32]),
                nonce: 7,
            },
            parent_block: None,
            miner_tx: Transaction {
                prefix: coinbase(5, Vec::new()),
                signatures: Vec::new(),
            },
            tx_hashes: vec![],
        }
    }

    #[test]
    fn test_v1_header_bytes() {
        let blob = to_blob(&v1_block().header).unwrap();
        let mut expected = vec![0x01, 0x00, 0xac, 0x02];
        expected.extend_from_slice(&[0x33; 32]);
        expected.extend_from_slice(&[0x07, 0x00, 0x00, 0x00]);
        assert_eq!(blob, expected);
    }

    #[test]
    fn test_v2_header_omits_timestamp_and_nonce() {
        let blob = to_blob(&merged_block(1, 0).header).unwrap();
        let mut expected = vec![0x02, 0x00];
        expected.extend_from_slice(&[0x33; 32]);
        assert_eq!(blob, expected);
    }

    #[test]
    fn test_v1_block_roundtrip() {
        let block = v1_block();
        let blob = to_blob(&block).unwrap();
        assert_eq!(from_blob::<Block>(&blob).unwrap(), block);
    }

    #[test]
    fn test_merged_block_roundtrip() {
        for (count, depth) in [(1, 0), (2, 1), (5, 3), (8, 2)] {
            let block = merged_block(count, depth);
            let blob = to_blob(&block).unwrap();
            assert_eq!(from_blob::<Block>(&blob).unwrap(), block, "{count} txs, depth {depth}");
        }
    }

    #[test]
    fn test_parent_section_layout() {
        let block = merged_block(1, 0);
        let blob = to_blob(&block).unwrap();
        let parent_start = 2 + 32;
        let mut expected = vec![0x01, 0x00, 0x64];
        expected.extend_from_slice(&[0x44; 32]);
        expected.extend_from_slice(&[0x04, 0x03, 0x02, 0x01]);
        expected.push(0x01);
        assert_eq!(&blob[parent_start..parent_start + expected.len()], &expected[..]);
    }

    #[test]
    fn test_view_flags() {
        let block = merged_block(4, 1);
        let header_only = ParentBlockView::of(&block, false, true).unwrap().to_blob().unwrap();
        assert_eq!(header_only.len(), 3 + 32 + 4 + 1);

        let hashing_header = ParentBlockView::of(&block, true, true).unwrap().to_blob().unwrap();
        let root = block.parent_block.as_ref().unwrap().merkle_root().unwrap();
        assert_eq!(hashing_header.len(), header_only.len() + 32);
        assert_eq!(&hashing_header[39..71], root.as_bytes());

        let full = ParentBlockView::of(&block, false, false).unwrap().to_blob().unwrap();
        assert!(full.starts_with(&header_only));
        assert!(full.len() > header_only.len() + 2 * 32);
    }

    #[test]
    fn test_v2_block_requires_parent() {
        let mut block = merged_block(1, 0);
        block.parent_block = None;
        assert!(matches!(to_blob(&block), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_v1_block_rejects_parent() {
        let mut block = v1_block();
        block.parent_block = Some(parent(1, 0));
        assert!(matches!(to_blob(&block), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_parent_version_bound() {
        let mut block = merged_block(1, 0);
        block.parent_block.as_mut().unwrap().major_version = 2;
        assert_eq!(to_blob(&block), Err(CodecError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_parent_needs_transactions() {
        let mut block = merged_block(1, 0);
        block.parent_block.as_mut().unwrap().transaction_count = 0;
        assert!(matches!(to_blob(&block), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_branch_lengths_enforced() {
        let mut block = merged_block(4, 1);
        block.parent_block.as_mut().unwrap().miner_tx_branch.pop();
        assert!(matches!(to_blob(&block), Err(CodecError::InvalidField(_))));

        let mut block = merged_block(4, 1);
        block.parent_block.as_mut().unwrap().blockchain_branch.clear();
        assert!(matches!(to_blob(&block), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_parent_needs_mm_tag() {
        let mut block = merged_block(1, 0);
        block.parent_block.as_mut().unwrap().miner_tx.prefix.extra.clear();
        assert!(matches!(to_blob(&block), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_mm_depth_bound() {
        let mut block = merged_block(1, 0);
        let mut extra = Vec::new();
        append_mm_tag_to_extra(
            &mut extra,
            &MergeMiningTag {
                depth: MAX_MERGE_MINING_DEPTH + 1,
                merkle_root: Hash::NULL,
            },
        )
        .unwrap();
        block.parent_block.as_mut().unwrap().miner_tx.prefix.extra = extra;
        assert!(matches!(to_blob(&block), Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_truncated_merged_block() {
        let blob = to_blob(&merged_block(5, 2)).unwrap();
        for cut in [1, 10, 40, 80, blob.len() - 1] {
            let err = from_blob::<Block>(&blob[..cut]).unwrap_err();
            assert!(err.is_truncation(), "cut at {cut}: {err:?}");
        }
    }

    #[test]
    fn test_legacy_block_uses_v1_header_layout() {
        let mut header = merged_block(1, 0).header;
        header.major_version = 3;
        let block = LegacyBlock {
            header,
            miner_tx: LegacyTransaction {
                prefix: coinbase(5, Vec::new()),
                signatures: Vec::new(),
            },
            tx_hashes: vec![Hash::from_bytes([9; 32])],
        };
        let blob = to_blob(&block).unwrap();
        assert_eq!(&blob[..3], &[0x03, 0x00, 0x64]);
        assert_eq!(block.header_blob().unwrap().len(), 3 + 32 + 4);
        assert_eq!(from_blob::<LegacyBlock>(&blob).unwrap(), block);
    }

    #[test]
    fn test_block_view_projection() {
        let block = merged_block(1, 0);
        let view = BlockView::from(&block);
        assert_eq!(view.header(), &block.header);
        assert_eq!(view.tx_hashes(), &block.tx_hashes[..]);
        assert_eq!(view.header_blob().unwrap(), to_blob(&block.header).unwrap());
    }
}
