//! # mica-storage
//!
//! Page-caching core for Mica: a fixed-size buffer pool over a paged disk
//! file.
//!
//! - **Buffer pool**: pins, dirty tracking, LRU-K eviction, extendible-hash
//!   page table
//! - **Disk manager**: synchronous page-granular I/O on a single database
//!   file

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Buffer pool: frames, replacer, pool manager
pub mod buffer;

/// Page-granular disk I/O
pub mod disk;
