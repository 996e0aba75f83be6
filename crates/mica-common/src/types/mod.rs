//! Type definitions for the Mica page cache.

mod ids;

pub use ids::PageId;
