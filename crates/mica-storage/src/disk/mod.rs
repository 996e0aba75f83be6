//! Page-granular disk I/O for the buffer pool.
//!
//! The buffer pool consumes the [`DiskManager`] trait: synchronous,
//! positioned reads and writes of fixed-size pages. [`FileDiskManager`]
//! implements it over a single database file.

mod error;
mod manager;

pub use error::{DiskError, DiskResult};
pub use manager::{DiskManager, FileDiskManager};
