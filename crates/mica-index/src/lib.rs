//! # mica-index
//!
//! In-memory index structures for the Mica page cache.
//!
//! This crate provides the dynamic hashing structure backing the buffer
//! pool's page table:
//!
//! - **Extendible hash table**: a power-of-two directory maps low-order
//!   hash bits to shared buckets, each with its own local depth; full
//!   buckets split lazily and may double the directory
//! - **Deterministic hashing**: SipHash-1-3 with fixed keys, so bucket
//!   placement is reproducible across runs
//!
//! # Example
//!
//! ```rust
//! use mica_index::ExtendibleHashTable;
//!
//! let table: ExtendibleHashTable<u64, String> = ExtendibleHashTable::new(4);
//! table.insert(1, "one".to_string());
//! assert_eq!(table.get(&1), Some("one".to_string()));
//! assert!(table.remove(&1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extendible;
pub mod hasher;

pub use extendible::{ExtendibleHashTable, DEFAULT_BUCKET_SIZE};
pub use hasher::DeterministicState;
