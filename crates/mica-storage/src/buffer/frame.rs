//! A frame is one slot of the buffer pool and the page it currently holds.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use mica_common::PageId;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Index of a frame within the pool's frame array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

impl FrameId {
    /// Sentinel for "no frame".
    pub const INVALID: Self = Self(usize::MAX);

    /// Wraps a raw array index.
    #[inline]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Unwraps back to the array index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// False only for [`FrameId::INVALID`].
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl From<usize> for FrameId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl From<FrameId> for usize {
    fn from(id: FrameId) -> Self {
        id.0
    }
}

/// One pool slot: a page-sized byte buffer plus the bookkeeping the pool
/// keeps about its occupant.
///
/// The bookkeeping (occupant id, pin count, dirty flag) is atomic so the
/// pool can share frames as `Arc<BufferFrame>` without locking the bytes,
/// while the bytes themselves sit behind their own read/write lock. All
/// bookkeeping writes happen under the pool latch.
pub struct BufferFrame {
    frame_id: FrameId,
    /// Occupant, or [`PageId::INVALID`] while the frame is unused.
    page_id: AtomicI32,
    /// Outstanding client borrows; nonzero blocks eviction.
    pin_count: AtomicU32,
    /// Set when the buffer diverges from the on-disk image.
    dirty: AtomicBool,
    data: RwLock<Vec<u8>>,
}

impl BufferFrame {
    /// Builds an unoccupied frame with a zeroed `page_size`-byte buffer.
    pub fn new(frame_id: FrameId, page_size: usize) -> Self {
        Self {
            frame_id,
            page_id: AtomicI32::new(PageId::INVALID.as_i32()),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
            data: RwLock::new(vec![0; page_size]),
        }
    }

    /// This frame's slot in the pool.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Id of the occupying page.
    #[inline]
    pub fn page_id(&self) -> PageId {
        PageId::new(self.page_id.load(Ordering::Acquire))
    }

    /// Installs a new occupant id.
    #[inline]
    pub fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.as_i32(), Ordering::Release);
    }

    /// True while no page occupies the frame.
    #[inline]
    pub fn is_free(&self) -> bool {
        !self.page_id().is_valid()
    }

    /// Current number of pins.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// True if at least one pin is outstanding.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Takes one pin on the frame.
    #[inline]
    pub fn pin(&self) {
        self.pin_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Drops one pin and returns how many remain.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let prev = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert_ne!(prev, 0, "pin count underflow");
        prev - 1
    }

    /// Whether the buffer carries modifications not yet written out.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Records whether the buffer matches the disk image.
    #[inline]
    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    /// Shared access to the page bytes.
    #[inline]
    pub fn data(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.data.read()
    }

    /// Exclusive access to the page bytes.
    #[inline]
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.data.write()
    }

    /// Clears the bookkeeping back to the unoccupied state. The byte
    /// buffer is untouched; callers zero it where stale contents must not
    /// leak to the next occupant.
    pub fn reset(&self) {
        self.set_page_id(PageId::INVALID);
        self.pin_count.store(0, Ordering::Release);
        self.set_dirty(false);
    }
}

impl fmt::Debug for BufferFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferFrame")
            .field("frame_id", &self.frame_id.index())
            .field("page_id", &self.page_id())
            .field("pins", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_BYTES: usize = 1024;

    fn frame() -> BufferFrame {
        BufferFrame::new(FrameId::new(3), FRAME_BYTES)
    }

    #[test]
    fn test_fresh_frame_is_unoccupied() {
        let frame = frame();

        assert_eq!(frame.frame_id(), FrameId::new(3));
        assert!(frame.is_free());
        assert!(!frame.is_pinned());
        assert!(!frame.is_dirty());

        let data = frame.data();
        assert_eq!(data.len(), FRAME_BYTES);
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pin_lifecycle() {
        let frame = frame();

        frame.pin();
        frame.pin();
        assert_eq!(frame.pin_count(), 2);

        assert_eq!(frame.unpin(), 1);
        assert!(frame.is_pinned());
        assert_eq!(frame.unpin(), 0);
        assert!(!frame.is_pinned());
    }

    #[test]
    fn test_dirty_toggles() {
        let frame = frame();
        for flag in [true, false, true] {
            frame.set_dirty(flag);
            assert_eq!(frame.is_dirty(), flag);
        }
    }

    #[test]
    fn test_occupancy_and_reset() {
        let frame = frame();

        frame.set_page_id(PageId::new(9));
        frame.pin();
        frame.set_dirty(true);
        assert!(!frame.is_free());
        assert_eq!(frame.page_id(), PageId::new(9));

        frame.reset();
        assert!(frame.is_free());
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_data_round_trip() {
        let frame = frame();
        frame.data_mut()[10..14].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&frame.data()[10..14], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_frame_id_conversions() {
        let id = FrameId::from(42usize);
        assert_eq!(id.index(), 42);
        assert_eq!(usize::from(id), 42);
        assert!(id.is_valid());
        assert!(!FrameId::INVALID.is_valid());
    }
}
