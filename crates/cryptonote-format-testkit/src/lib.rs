//! # CryptoNote Format Testkit
//!
//! Testing utilities for the CryptoNote format crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Parameterized blocks with pinned header encodings
//! - **Generators**: Proptest strategies producing only encodable objects
//! - **Fixtures**: A seeded builder for blocks and transactions
//!
//! ## Golden Vectors
//!
//! ```rust
//! use cryptonote_format::block_hash;
//! use cryptonote_format_testkit::vectors::{all_vectors, block_from_vector};
//!
//! for vector in all_vectors() {
//!     let block = block_from_vector(&vector);
//!     let id = block_hash(&block).unwrap();
//!     println!("{}: {}", vector.name, id.to_hex());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use cryptonote_format::{block_from_blob, block_to_blob};
//! use cryptonote_format_testkit::generators::{block_from_params, BlockParams};
//!
//! proptest! {
//!     #[test]
//!     fn block_roundtrips(params: BlockParams) {
//!         let block = block_from_params(&params);
//!         let blob = block_to_blob(&block).unwrap();
//!         prop_assert_eq!(block_from_blob(&blob).unwrap(), block);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use cryptonote_format_testkit::fixtures::TestFixture;
//!
//! let mut fixture = TestFixture::with_seed(42);
//! let block = fixture.make_block(2, 3);
//! assert!(block.parent_block.is_some());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{seeded_fixtures, TestFixture};
pub use generators::{block_from_params, legacy_block_from_params, BlockParams};
pub use vectors::{all_vectors, block_from_vector, verify_all_vectors, GoldenVector};
