//! # CryptoNote Format
//!
//! Blocks, transactions and the hashing protocol that derives their ids.
//!
//! ## Overview
//!
//! - **Transactions**: prefix, inputs, outputs and count-less signature runs
//! - **tx_extra**: the tagged-field stream carried in every transaction
//! - **Blocks**: version-dependent headers, merge-mined parent blocks, and the
//!   pre-fork legacy layout
//! - **Hashing**: hashing blobs, block and transaction ids, proof-of-work input
//!
//! ## Key Concepts
//!
//! - **Blob**: the canonical encoding of an object. Used for storage and transport.
//! - **Hashing blob**: the bytes actually hashed for a block id. Not the blob.
//! - **Parent block**: from major version 2, the parent chain block a block
//!   was merge-mined in. Its serialization borrows the block's timestamp and nonce.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cryptonote_format::{ChainFormat, FormatConfig};
//!
//! fn example(blob: &[u8]) -> cryptonote_format::Result<()> {
//!     let format = ChainFormat::new(FormatConfig::default());
//!
//!     let block = format.parse_block(blob)?;
//!     let id = format.block_id(&block)?;
//!     println!("block {id} with {} transactions", block.tx_hashes.len() + 1);
//!
//!     let fields = format.parse_extra(&block.miner_tx.prefix.extra)?;
//!     println!("miner tx_extra has {} records", fields.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `cryptonote_format::core` - Varints, the archive, the codec trait, hash primitives

pub mod block;
pub mod error;
pub mod format;
pub mod hashing;
pub mod transaction;
pub mod tx_extra;

pub use cryptonote_format_core as core;

pub use block::{
    Block, BlockHeader, BlockView, LegacyBlock, ParentBlock, ParentBlockView,
    BLOCK_MAJOR_VERSION_1, BLOCK_MAJOR_VERSION_2, BLOCK_MINOR_VERSION_0,
};
pub use error::{FormatError, Result};
pub use format::{ChainFormat, FormatConfig, DEFAULT_MAX_EXTRA_SIZE};
pub use hashing::{
    blob_hash, block_from_blob, block_hash, block_hashing_blob, block_header_hash,
    block_long_hash, block_pow_hashing_input, block_to_blob, block_tree_hash_input,
    block_tx_tree_hash, hashing_blob, legacy_block_from_blob, legacy_block_hash,
    legacy_block_hashing_blob, legacy_transaction_hash, transaction_hash,
    transaction_hash_and_size, tx_tree_hash,
};
pub use transaction::{
    LegacyTransaction, Transaction, TransactionPrefix, TxIn, TxOut, TxOutTarget, TxOutToScript,
    CURRENT_TRANSACTION_VERSION,
};
pub use tx_extra::{
    append_mm_tag_to_extra, append_nonce_to_extra, append_tx_pub_key_to_extra, find_field,
    get_mm_tag_from_extra, parse_tx_extra, serialize_tx_extra, tx_pub_key_from_extra,
    ExtraFieldKind, MergeMiningTag, TxExtraField, TxExtraMinergate, TxExtraNonce, TxExtraPadding,
    MAX_MERGE_MINING_DEPTH, TX_EXTRA_MERGE_MINING_TAG, TX_EXTRA_MYSTERIOUS_MINERGATE_TAG,
    TX_EXTRA_NONCE, TX_EXTRA_NONCE_MAX_COUNT, TX_EXTRA_PADDING_MAX_COUNT, TX_EXTRA_TAG_PADDING,
    TX_EXTRA_TAG_PUBKEY,
};
