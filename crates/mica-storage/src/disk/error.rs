//! Disk I/O error types.

use std::io;

use mica_common::PageId;
use thiserror::Error;

/// Result type for disk operations.
pub type DiskResult<T> = Result<T, DiskError>;

/// Errors that can occur during page I/O.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum DiskError {
    /// Standard I/O error.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Page id outside the valid range.
    #[error("invalid page id: {page_id:?}")]
    InvalidPageId { page_id: PageId },

    /// Buffer length does not match the configured page size.
    #[error("page buffer size mismatch: expected {expected} bytes, got {actual}")]
    PageSizeMismatch { expected: usize, actual: usize },
}

impl DiskError {
    /// Creates an invalid page id error.
    pub fn invalid_page_id(page_id: PageId) -> Self {
        Self::InvalidPageId { page_id }
    }

    /// Creates a page size mismatch error.
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::PageSizeMismatch { expected, actual }
    }
}
