//! Buffer pool manager.
//!
//! The pool owns a fixed array of frames, a page table mapping resident
//! page ids to frames, an LRU-K replacer, and a free list. One latch guards
//! the pool for the full span of every public operation, so frame metadata,
//! page-table and replacer updates stay atomic with respect to each other.
//! Lock order is pool latch first, then the page-table or replacer latch;
//! those two are never held across each other. Disk I/O runs while the pool
//! latch is held.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mica_common::PageId;
use mica_index::ExtendibleHashTable;
use parking_lot::Mutex;
use tracing::debug;

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::eviction::LruKReplacer;
use super::frame::{BufferFrame, FrameId};
use super::BufferPoolStats;
use crate::disk::DiskManager;

/// State guarded by the pool latch: the free list and the page id
/// allocator.
#[derive(Debug)]
struct PoolState {
    free_list: VecDeque<FrameId>,
    next_page_id: PageId,
}

/// A fixed-size page cache over a disk manager.
///
/// Frames are handed to clients as `Arc<BufferFrame>`; a client that
/// received a pinned frame must release the pin with
/// [`unpin_page`](Self::unpin_page) once it is done with the page. A pin
/// that is never released permanently wastes a frame.
pub struct BufferPoolManager {
    config: BufferPoolConfig,
    frames: Vec<Arc<BufferFrame>>,
    /// Page table mapping resident page ids to frames.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    replacer: LruKReplacer,
    disk: Arc<dyn DiskManager>,
    state: Mutex<PoolState>,
    fetch_count: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    eviction_count: AtomicU64,
    flush_count: AtomicU64,
}

impl BufferPoolManager {
    /// Creates a buffer pool over `disk` with every frame on the free list.
    pub fn new(config: BufferPoolConfig, disk: Arc<dyn DiskManager>) -> BufferResult<Self> {
        config.validate().map_err(BufferError::config)?;

        let frames = (0..config.pool_size)
            .map(|i| Arc::new(BufferFrame::new(FrameId::new(i), config.page_size)))
            .collect();

        Ok(Self {
            frames,
            page_table: ExtendibleHashTable::new(config.bucket_size),
            replacer: LruKReplacer::new(config.pool_size, config.replacer_k),
            disk,
            state: Mutex::new(PoolState {
                free_list: (0..config.pool_size).map(FrameId::new).collect(),
                next_page_id: PageId::FIRST,
            }),
            config,
            fetch_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        })
    }

    /// Allocates a fresh zeroed page in a frame, pinned for the caller.
    ///
    /// Fails with [`BufferError::PoolExhausted`] when no frame is free and
    /// no frame can be evicted.
    pub fn new_page(&self) -> BufferResult<(PageId, Arc<BufferFrame>)> {
        let mut state = self.state.lock();

        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id.index()];

        let page_id = state.next_page_id;
        state.next_page_id = page_id.next();

        frame.data_mut().fill(0);
        frame.set_page_id(page_id);
        frame.pin();

        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false)?;
        self.page_table.insert(page_id, frame_id);

        debug!(page_id = %page_id, frame_id = frame_id.index(), "allocated page");
        Ok((page_id, Arc::clone(frame)))
    }

    /// Returns the frame holding `page_id`, reading it from disk on a miss.
    ///
    /// A miss pins the frame for the caller and marks it non-evictable; a
    /// hit only refreshes the page's access history and leaves the pin
    /// count untouched, so callers unpin once per miss, not once per fetch.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<Arc<BufferFrame>> {
        let mut state = self.state.lock();
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        if let Some(frame_id) = self.page_table.get(&page_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            self.replacer.record_access(frame_id);
            return Ok(Arc::clone(&self.frames[frame_id.index()]));
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id.index()];

        frame.set_page_id(page_id);
        frame.pin();
        self.page_table.insert(page_id, frame_id);
        {
            let mut data = frame.data_mut();
            self.disk.read_page(page_id, &mut data)?;
        }
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false)?;

        Ok(Arc::clone(frame))
    }

    /// Releases one pin on `page_id`; the frame becomes evictable when its
    /// pin count reaches zero. The frame's dirty flag is overwritten with
    /// `is_dirty`, it is not merged with the previous value.
    ///
    /// Returns `false` when the page is not resident or not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _state = self.state.lock();

        let Some(frame_id) = self.page_table.get(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return false;
        }

        if frame.unpin() == 0 {
            self.replacer
                .set_evictable(frame_id, true)
                .expect("unpinned frame is tracked by the replacer");
        }
        frame.set_dirty(is_dirty);
        true
    }

    /// Writes `page_id`'s frame to disk unconditionally and clears its
    /// dirty flag. Pin state is unchanged. Returns `Ok(false)` when the
    /// page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> BufferResult<bool> {
        let _state = self.state.lock();
        self.flush_page_locked(page_id)
    }

    /// Flushes every resident page. Order is unspecified.
    pub fn flush_all_pages(&self) -> BufferResult<()> {
        let _state = self.state.lock();
        for frame in &self.frames {
            let page_id = frame.page_id();
            if page_id.is_valid() {
                self.flush_page_locked(page_id)?;
            }
        }
        Ok(())
    }

    /// Drops `page_id` from the pool and deallocates it on disk. Dirty data
    /// is discarded, not flushed.
    ///
    /// Returns `Ok(true)` when the page is gone, including when it was not
    /// resident to begin with, and `Ok(false)` when a pin blocks deletion.
    pub fn delete_page(&self, page_id: PageId) -> BufferResult<bool> {
        let mut state = self.state.lock();

        let Some(frame_id) = self.page_table.get(&page_id) else {
            return Ok(true);
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() > 0 {
            return Ok(false);
        }

        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id)?;
        frame.data_mut().fill(0);
        frame.reset();
        state.free_list.push_back(frame_id);
        self.disk.deallocate_page(page_id)?;

        debug!(page_id = %page_id, frame_id = frame_id.index(), "deleted page");
        Ok(true)
    }

    /// Returns true if `page_id` is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.contains(&page_id)
    }

    /// Pin count of a resident page.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let _state = self.state.lock();
        let frame_id = self.page_table.get(&page_id)?;
        Some(self.frames[frame_id.index()].pin_count())
    }

    /// Frames immediately available to new occupants: free plus evictable.
    pub fn free_frame_count(&self) -> usize {
        let state = self.state.lock();
        state.free_list.len() + self.replacer.size()
    }

    /// Number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    /// Page size in bytes.
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> BufferPoolStats {
        let state = self.state.lock();

        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            fetches: self.fetch_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
            free_frames: state.free_list.len(),
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Hands out a frame for a new occupant: the free list first, then a
    /// replacer eviction. A dirty victim is written back before reuse.
    fn acquire_frame(&self, state: &mut PoolState) -> BufferResult<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self.replacer.evict().ok_or(BufferError::PoolExhausted)?;
        let frame = &self.frames[frame_id.index()];
        debug_assert_eq!(frame.pin_count(), 0, "evicted frame must be unpinned");

        let old_page_id = frame.page_id();
        if frame.is_dirty() {
            let data = frame.data();
            self.disk.write_page(old_page_id, &data)?;
            drop(data);
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }
        if old_page_id.is_valid() {
            self.page_table.remove(&old_page_id);
        }
        frame.reset();

        self.eviction_count.fetch_add(1, Ordering::Relaxed);
        debug!(page_id = %old_page_id, frame_id = frame_id.index(), "evicted page");
        Ok(frame_id)
    }

    /// Flush body shared by [`flush_page`](Self::flush_page) and
    /// [`flush_all_pages`](Self::flush_all_pages); the caller holds the
    /// pool latch.
    fn flush_page_locked(&self, page_id: PageId) -> BufferResult<bool> {
        let Some(frame_id) = self.page_table.get(&page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.index()];

        {
            let data = frame.data();
            self.disk.write_page(page_id, &data)?;
        }
        frame.set_dirty(false);
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        // A flush counts as an access: the replacer treats a just-flushed
        // page as recently used.
        self.replacer.record_access(frame_id);

        Ok(true)
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("pool_size", &self.config.pool_size)
            .field("page_size", &self.config.page_size)
            .field("free_frames", &self.state.lock().free_list.len())
            .finish()
    }
}
