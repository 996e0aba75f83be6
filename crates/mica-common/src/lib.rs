//! # mica-common
//!
//! Common types and constants for the Mica page cache.
//!
//! This crate provides the foundational pieces shared by the other Mica
//! crates:
//!
//! - **Types**: the [`PageId`](types::PageId) identifier newtype
//! - **Constants**: page geometry and cache tuning defaults
//!
//! ## Example
//!
//! ```rust
//! use mica_common::types::PageId;
//!
//! let page_id = PageId::new(42);
//! assert!(page_id.is_valid());
//! assert!(!PageId::INVALID.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::PageId;
