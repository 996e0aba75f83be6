//! Core identifier types for the Mica page cache.
//!
//! These types provide type-safe wrappers around numeric identifiers,
//! preventing accidental misuse of different ID kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page identifier - uniquely identifies a page in the database file.
///
/// Page ids are assigned monotonically starting from 0. The sentinel
/// [`PageId::INVALID`] (-1) means "no page".
///
/// # Example
///
/// ```rust
/// use mica_common::types::PageId;
///
/// let page = PageId::new(42);
/// assert_eq!(page.as_i32(), 42);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageId(i32);

impl PageId {
    /// Invalid page ID constant, used as a sentinel value.
    pub const INVALID: Self = Self(-1);

    /// First page id handed out by a fresh allocator.
    pub const FIRST: Self = Self(0);

    /// Creates a new `PageId` from a raw i32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw i32 value.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Returns the next page ID.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this is a valid page ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Byte offset of this page in a file of `page_size`-byte pages.
    #[inline]
    #[must_use]
    pub const fn file_offset(self, page_size: usize) -> u64 {
        self.0 as u64 * page_size as u64
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "PageId(INVALID)")
        } else {
            write!(f, "PageId({})", self.0)
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PageId {
    #[inline]
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<PageId> for i32 {
    #[inline]
    fn from(id: PageId) -> Self {
        id.0
    }
}
