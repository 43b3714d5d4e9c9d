//! Hash primitives consumed by the hashing protocol.
//!
//! - [`cn_fast_hash`]: Keccak-256 with the original Keccak padding (not SHA3).
//! - [`tree_hash`]: the CryptoNote Merkle root over an ordered hash list.
//! - [`tree_branch`] / [`tree_hash_from_branch`]: proof path of the first leaf,
//!   which is how a merge-mined parent block commits to its miner transaction.
//! - [`SlowHash`]: the proof-of-work hash, supplied by the caller.

use tiny_keccak::{Hasher, Keccak};

use crate::error::HashError;
use crate::types::Hash;

/// Keccak-256 of `data`.
pub fn cn_fast_hash(data: &[u8]) -> Hash {
    let mut keccak = Keccak::v256();
    keccak.update(data);
    let mut out = [0u8; 32];
    keccak.finalize(&mut out);
    Hash(out)
}

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut keccak = Keccak::v256();
    keccak.update(&left.0);
    keccak.update(&right.0);
    let mut out = [0u8; 32];
    keccak.finalize(&mut out);
    Hash(out)
}

/// Largest power of two strictly below `count`, for `count >= 3`.
fn tree_width(count: usize) -> usize {
    let n = count - 1;
    1 << (usize::BITS - 1 - n.leading_zeros())
}

/// First reduction: the leading `2 * width - count` hashes pass through,
/// the rest are hashed pairwise, leaving exactly `width` nodes.
fn first_level(hashes: &[Hash], width: usize) -> Vec<Hash> {
    let promoted = 2 * width - hashes.len();
    let mut level = Vec::with_capacity(width);
    level.extend_from_slice(&hashes[..promoted]);
    for pair in hashes[promoted..].chunks_exact(2) {
        level.push(hash_pair(&pair[0], &pair[1]));
    }
    level
}

fn halve(level: &mut Vec<Hash>) {
    let half = level.len() / 2;
    for j in 0..half {
        level[j] = hash_pair(&level[2 * j], &level[2 * j + 1]);
    }
    level.truncate(half);
}

/// Merkle root of `hashes`, in the order given.
pub fn tree_hash(hashes: &[Hash]) -> Result<Hash, HashError> {
    match hashes {
        [] => Err(HashError::EmptyTree),
        [only] => Ok(*only),
        [left, right] => Ok(hash_pair(left, right)),
        _ => {
            let mut level = first_level(hashes, tree_width(hashes.len()));
            while level.len() > 2 {
                halve(&mut level);
            }
            Ok(hash_pair(&level[0], &level[1]))
        }
    }
}

/// Length of the first leaf's branch in a tree of `count` leaves.
///
/// `floor(log2(count))`; zero for an empty or single-leaf tree.
pub fn tree_depth(count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    (usize::BITS - 1 - count.leading_zeros()) as usize
}

/// Sibling hashes from the root down to the first leaf of `hashes`.
pub fn tree_branch(hashes: &[Hash]) -> Result<Vec<Hash>, HashError> {
    match hashes {
        [] => Err(HashError::EmptyTree),
        [_] => Ok(Vec::new()),
        [_, right] => Ok(vec![*right]),
        _ => {
            let width = tree_width(hashes.len());
            let mut siblings = Vec::with_capacity(tree_depth(hashes.len()));
            if 2 * width == hashes.len() {
                siblings.push(hashes[1]);
            }
            let mut level = first_level(hashes, width);
            while level.len() > 2 {
                siblings.push(level[1]);
                halve(&mut level);
            }
            siblings.push(level[1]);
            siblings.reverse();
            Ok(siblings)
        }
    }
}

/// Root of a tree whose first leaf is `leaf`, given that leaf's branch.
pub fn tree_hash_from_branch(branch: &[Hash], leaf: &Hash) -> Hash {
    branch
        .iter()
        .rev()
        .fold(*leaf, |node, sibling| hash_pair(&node, sibling))
}

/// Fail with [`HashError::HashMismatch`] unless `actual == expected`.
pub fn verify_hash(expected: &Hash, actual: &Hash) -> Result<(), HashError> {
    if expected == actual {
        Ok(())
    } else {
        Err(HashError::HashMismatch {
            expected: *expected,
            actual: *actual,
        })
    }
}

/// The proof-of-work hash function.
///
/// The format layer only builds the input; the slow hash itself lives with
/// the consensus code that owns its parameters.
pub trait SlowHash {
    /// Hash `data` with the proof-of-work function.
    fn slow_hash(&self, data: &[u8]) -> Hash;
}

impl<F> SlowHash for F
where
    F: Fn(&[u8]) -> Hash,
{
    fn slow_hash(&self, data: &[u8]) -> Hash {
        self(data)
    }
}
