//! The block and transaction hashing protocol.
//!
//! Identifiers are hashes of *hashing blobs*, not of full encodings. A block's
//! hashing blob is its header followed by the root of the tree over
//! `[miner_tx_hash, tx_hashes...]` and the varint transaction count:
//!
//! ```text
//! header_blob ++ tree_hash([M, t1, .., tn]) ++ varint(n + 1)
//! ```
//!
//! From major version 2 the block id additionally covers the parent block
//! section, serialized with the parent's transaction-tree root in place.

use cryptonote_format_core::{
    cn_fast_hash, from_blob, object_hash, object_hash_with_size, to_blob, tree_hash, varint_bytes,
    CodecError, Hash, HashError, SlowHash,
};

use crate::block::{Block, BlockView, LegacyBlock, ParentBlockView};
use crate::transaction::{LegacyTransaction, Transaction};

/// Hash of an arbitrary blob.
pub fn blob_hash(blob: &[u8]) -> Hash {
    cn_fast_hash(blob)
}

/// Id of a transaction: the hash of its full encoding.
pub fn transaction_hash(tx: &Transaction) -> Result<Hash, CodecError> {
    object_hash(tx)
}

/// Id of a transaction together with its encoded size.
pub fn transaction_hash_and_size(tx: &Transaction) -> Result<(Hash, usize), CodecError> {
    object_hash_with_size(tx)
}

/// Id of a pre-fork transaction: the hash of its prefix only.
pub fn legacy_transaction_hash(tx: &LegacyTransaction) -> Result<Hash, CodecError> {
    object_hash(&tx.prefix)
}

/// Root of the tree over an ordered list of transaction hashes.
pub fn tx_tree_hash(hashes: &[Hash]) -> Result<Hash, HashError> {
    tree_hash(hashes)
}

/// The leaves of a block's transaction tree: miner transaction first, then
/// the listed transactions in block order.
pub fn block_tree_hash_input(view: BlockView<'_>) -> Result<Vec<Hash>, CodecError> {
    let tx_hashes = view.tx_hashes();
    let mut leaves = Vec::with_capacity(tx_hashes.len() + 1);
    leaves.push(view.miner_tx_hash()?);
    leaves.extend_from_slice(tx_hashes);
    Ok(leaves)
}

/// Root of a block's transaction tree.
pub fn block_tx_tree_hash(view: BlockView<'_>) -> Result<Hash, HashError> {
    tx_tree_hash(&block_tree_hash_input(view)?)
}

/// Hashing blob of either block layout.
pub fn hashing_blob(view: BlockView<'_>) -> Result<Vec<u8>, HashError> {
    let mut blob = view.header_blob()?;
    blob.extend_from_slice(block_tx_tree_hash(view)?.as_bytes());
    blob.extend_from_slice(&varint_bytes(view.tx_hashes().len() as u64 + 1));
    Ok(blob)
}

/// Hashing blob of a current-layout block.
pub fn block_hashing_blob(block: &Block) -> Result<Vec<u8>, HashError> {
    hashing_blob(BlockView::Current(block))
}

/// Hashing blob of a pre-fork block.
pub fn legacy_block_hashing_blob(block: &LegacyBlock) -> Result<Vec<u8>, HashError> {
    hashing_blob(BlockView::Legacy(block))
}

/// Hash of the block's hashing blob, without any parent block.
pub fn block_header_hash(block: &Block) -> Result<Hash, HashError> {
    Ok(cn_fast_hash(&block_hashing_blob(block)?))
}

/// Id of a block.
///
/// Below major version 2 this is [`block_header_hash`]. From version 2 the
/// hashed bytes are the hashing blob followed by the parent section in
/// hashing form: the parent's transaction-tree root after the nonce, and
/// the full branches and miner transaction after the transaction count.
pub fn block_hash(block: &Block) -> Result<Hash, HashError> {
    let mut blob = block_hashing_blob(block)?;
    if block.header.has_parent_block() {
        tracing::trace!(
            major_version = block.header.major_version,
            "hashing block with parent block section"
        );
        blob.extend_from_slice(&ParentBlockView::of(block, true, false)?.to_blob()?);
    }
    Ok(cn_fast_hash(&blob))
}

/// Id of a pre-fork block.
pub fn legacy_block_hash(block: &LegacyBlock) -> Result<Hash, HashError> {
    Ok(cn_fast_hash(&legacy_block_hashing_blob(block)?))
}

/// Bytes fed to the proof-of-work hash.
///
/// `_height` is kept for height-dependent hashing rules; it does not change
/// the result for any block this format knows.
pub fn block_pow_hashing_input(block: &Block, _height: u64) -> Result<Vec<u8>, HashError> {
    block_hashing_blob(block)
}

/// Proof-of-work hash of `block` under `hasher`.
pub fn block_long_hash<H>(block: &Block, height: u64, hasher: &H) -> Result<Hash, HashError>
where
    H: SlowHash + ?Sized,
{
    let input = block_pow_hashing_input(block, height)?;
    Ok(hasher.slow_hash(&input))
}

/// Full encoding of a block, for storage and transport.
pub fn block_to_blob(block: &Block) -> Result<Vec<u8>, CodecError> {
    to_blob(block)
}

/// Decode a block from its full encoding. The whole blob must be consumed.
pub fn block_from_blob(blob: &[u8]) -> Result<Block, CodecError> {
    from_blob(blob)
}

/// Decode a pre-fork block from its full encoding.
pub fn legacy_block_from_blob(blob: &[u8]) -> Result<LegacyBlock, CodecError> {
    from_blob(blob)
}
