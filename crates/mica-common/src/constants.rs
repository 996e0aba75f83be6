//! System-wide constants for the Mica page cache.

// =============================================================================
// Page Geometry
// =============================================================================

/// Default page size in bytes (4 KB).
///
/// Matches the common OS page size and SSD block size.
pub const PAGE_SIZE: usize = 4 * 1024;

/// Minimum supported page size in bytes.
pub const MIN_PAGE_SIZE: usize = 512;

/// Maximum supported page size in bytes (64 KB).
pub const MAX_PAGE_SIZE: usize = 64 * 1024;

// =============================================================================
// Buffer Pool Defaults
// =============================================================================

/// Default number of frames in a buffer pool.
pub const DEFAULT_POOL_SIZE: usize = 128;

/// Default history window for the LRU-K replacer (LRU-2).
pub const DEFAULT_REPLACER_K: usize = 2;
