//! `ChainFormat`: one entry point for parsing and identifying chain objects.
//!
//! The free functions in [`crate::hashing`] and [`crate::tx_extra`] do the
//! work; the facade adds the policy from [`FormatConfig`] on top of them.

use serde::Deserialize;

use cryptonote_format_core::{from_blob, to_blob, verify_hash, BinaryCodec, CodecError, Hash};

use crate::block::{Block, LegacyBlock};
use crate::error::{FormatError, Result};
use crate::hashing::{block_hash, legacy_block_hash, transaction_hash};
use crate::transaction::Transaction;
use crate::tx_extra::{parse_tx_extra, TxExtraField};

/// Largest tx_extra the facade accepts by default.
pub const DEFAULT_MAX_EXTRA_SIZE: usize = 1060;

/// Configuration for [`ChainFormat`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Re-encode every parsed object and reject it unless the bytes match.
    pub verify_round_trip: bool,
    /// Upper bound on a transaction's extra, in bytes.
    pub max_extra_size: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            verify_round_trip: true,
            max_extra_size: DEFAULT_MAX_EXTRA_SIZE,
        }
    }
}

impl FormatConfig {
    /// Load from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Parses and identifies blocks and transactions under one [`FormatConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChainFormat {
    config: FormatConfig,
}

impl ChainFormat {
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Parsing
    // ─────────────────────────────────────────────────────────────────────────

    fn decode<T: BinaryCodec>(&self, object: &'static str, blob: &[u8]) -> Result<T> {
        let value: T = from_blob(blob)?;
        if self.config.verify_round_trip && to_blob(&value)? != blob {
            tracing::warn!(object, size = blob.len(), "rejecting non-canonical encoding");
            return Err(CodecError::NonCanonicalEncoding.into());
        }
        Ok(value)
    }

    fn check_extra_size(&self, extra: &[u8]) -> Result<()> {
        if extra.len() > self.config.max_extra_size {
            tracing::warn!(
                size = extra.len(),
                max = self.config.max_extra_size,
                "rejecting oversized tx_extra"
            );
            return Err(FormatError::ExtraTooLarge {
                size: extra.len(),
                max: self.config.max_extra_size,
            });
        }
        Ok(())
    }

    /// Parse a block from its full encoding.
    ///
    /// The extra size limit covers the miner transaction and, from version 2,
    /// the parent block's miner transaction.
    pub fn parse_block(&self, blob: &[u8]) -> Result<Block> {
        let block: Block = self.decode("block", blob)?;
        self.check_extra_size(&block.miner_tx.prefix.extra)?;
        if let Some(parent) = &block.parent_block {
            self.check_extra_size(&parent.miner_tx.prefix.extra)?;
        }
        Ok(block)
    }

    /// Parse a pre-fork block from its full encoding.
    pub fn parse_legacy_block(&self, blob: &[u8]) -> Result<LegacyBlock> {
        let block: LegacyBlock = self.decode("legacy block", blob)?;
        self.check_extra_size(&block.miner_tx.prefix.extra)?;
        Ok(block)
    }

    /// Parse a transaction from its full encoding.
    pub fn parse_transaction(&self, blob: &[u8]) -> Result<Transaction> {
        let tx: Transaction = self.decode("transaction", blob)?;
        self.check_extra_size(&tx.prefix.extra)?;
        Ok(tx)
    }

    /// Split a tx_extra buffer into its records.
    pub fn parse_extra(&self, extra: &[u8]) -> Result<Vec<TxExtraField>> {
        self.check_extra_size(extra)?;
        parse_tx_extra(extra).map_err(|err| {
            tracing::warn!(error = %err, size = extra.len(), "rejecting tx_extra");
            err.into()
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identifiers
    // ─────────────────────────────────────────────────────────────────────────

    /// Id of a block, covering its parent block section from version 2.
    pub fn block_id(&self, block: &Block) -> Result<Hash> {
        Ok(block_hash(block)?)
    }

    /// Id of a pre-fork block.
    pub fn legacy_block_id(&self, block: &LegacyBlock) -> Result<Hash> {
        Ok(legacy_block_hash(block)?)
    }

    /// Id of a transaction: the hash of its full encoding.
    pub fn transaction_id(&self, tx: &Transaction) -> Result<Hash> {
        Ok(transaction_hash(tx)?)
    }

    /// Fail with a hash mismatch unless `block` hashes to `expected`.
    pub fn verify_block_id(&self, block: &Block, expected: &Hash) -> Result<()> {
        Ok(verify_hash(expected, &self.block_id(block)?)?)
    }

    /// Fail with a hash mismatch unless `tx` hashes to `expected`.
    pub fn verify_transaction_id(&self, tx: &Transaction, expected: &Hash) -> Result<()> {
        Ok(verify_hash(expected, &self.transaction_id(tx)?)?)
    }
}
