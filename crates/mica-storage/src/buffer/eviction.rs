//! LRU-K eviction policy for the buffer pool.
//!
//! LRU-K (Johnson and Shasha, 1994) evicts the frame whose backward
//! k-distance is largest. The distance is measured over a sliding window of
//! the k most recent access timestamps; a frame with fewer than k recorded
//! accesses has an infinite distance, and ties between such frames fall
//! back to classical LRU on the earliest recorded access.
//!
//! Evictability is tracked separately from access history: the buffer pool
//! pins a frame by marking it non-evictable, and [`LruKReplacer::size`]
//! counts evictable frames only.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use super::error::{BufferError, BufferResult};
use super::frame::FrameId;

/// Backward k-distance of a frame with fewer than k recorded accesses.
const INFINITE_K_DISTANCE: u64 = u64::MAX;

/// Access history for a single tracked frame.
#[derive(Debug)]
struct FrameRecord {
    /// The k most recent access timestamps, oldest first.
    history: VecDeque<u64>,
    evictable: bool,
    k: usize,
}

impl FrameRecord {
    fn new(k: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(k),
            evictable: false,
            k,
        }
    }

    /// Appends an access, keeping only the k most recent.
    fn record(&mut self, timestamp: u64) {
        self.history.push_back(timestamp);
        if self.history.len() > self.k {
            self.history.pop_front();
        }
    }

    /// Spread between the k-th most recent access and the oldest retained
    /// one; infinite while fewer than k accesses are on record.
    fn k_distance(&self) -> u64 {
        if self.history.len() < self.k {
            return INFINITE_K_DISTANCE;
        }
        match (self.history.front(), self.history.back()) {
            (Some(&oldest), Some(&newest)) => newest - oldest,
            _ => INFINITE_K_DISTANCE,
        }
    }

    fn earliest_access(&self) -> u64 {
        self.history.front().copied().unwrap_or(0)
    }
}

/// Mutable replacer state behind the latch.
#[derive(Debug)]
struct ReplacerState {
    frames: HashMap<FrameId, FrameRecord>,
    /// Number of evictable records.
    curr_size: usize,
    /// Monotonic tick, advanced after every recorded access. Never rewound.
    current_timestamp: u64,
}

/// LRU-K replacement policy over buffer pool frames.
///
/// All state sits behind a single latch; every method takes `&self` and is
/// safe to call from any thread.
#[derive(Debug)]
pub struct LruKReplacer {
    replacer_size: usize,
    k: usize,
    state: Mutex<ReplacerState>,
}

impl LruKReplacer {
    /// Creates a replacer tracking up to `replacer_size` frames with a
    /// history window of `k` accesses.
    pub fn new(replacer_size: usize, k: usize) -> Self {
        Self {
            replacer_size,
            k: k.max(1),
            state: Mutex::new(ReplacerState {
                frames: HashMap::new(),
                curr_size: 0,
                current_timestamp: 0,
            }),
        }
    }

    /// Frame ids are checked against an inclusive upper bound.
    fn check_frame_id(&self, frame_id: FrameId) {
        assert!(
            frame_id.index() <= self.replacer_size,
            "frame id {} is out of range for replacer of size {}",
            frame_id.index(),
            self.replacer_size,
        );
    }

    /// Records an access to `frame_id` at the current tick, creating its
    /// history on first sight.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range.
    pub fn record_access(&self, frame_id: FrameId) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();
        let timestamp = state.current_timestamp;
        state
            .frames
            .entry(frame_id)
            .or_insert_with(|| FrameRecord::new(self.k))
            .record(timestamp);
        state.current_timestamp += 1;
    }

    /// Marks `frame_id` evictable or not, adjusting the evictable count on
    /// a transition. Calls that match the current flag are no-ops.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) -> BufferResult<()> {
        self.check_frame_id(frame_id);
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let record = state
            .frames
            .get_mut(&frame_id)
            .ok_or(BufferError::FrameNotTracked {
                frame_id: frame_id.index(),
            })?;

        if record.evictable != evictable {
            record.evictable = evictable;
            if evictable {
                state.curr_size += 1;
            } else {
                state.curr_size -= 1;
            }
        }
        Ok(())
    }

    /// Drops `frame_id`'s access history regardless of its k-distance.
    /// Removing an untracked frame is a no-op; removing a non-evictable
    /// frame is an error.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range.
    pub fn remove(&self, frame_id: FrameId) -> BufferResult<()> {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();

        let evictable = match state.frames.get(&frame_id) {
            None => return Ok(()),
            Some(record) => record.evictable,
        };
        if !evictable {
            return Err(BufferError::FrameNotEvictable {
                frame_id: frame_id.index(),
            });
        }

        state.frames.remove(&frame_id);
        state.curr_size -= 1;
        Ok(())
    }

    /// Evicts the evictable frame with the largest backward k-distance,
    /// breaking ties towards the earliest recorded access. The victim's
    /// history is dropped.
    pub fn evict(&self) -> Option<FrameId> {
        let mut state = self.state.lock();

        let victim = state
            .frames
            .iter()
            .filter(|(_, record)| record.evictable)
            .max_by(|(_, a), (_, b)| {
                a.k_distance()
                    .cmp(&b.k_distance())
                    .then_with(|| b.earliest_access().cmp(&a.earliest_access()))
            })
            .map(|(&frame_id, _)| frame_id)?;

        state.frames.remove(&victim);
        state.curr_size -= 1;
        Some(victim)
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.state.lock().curr_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: usize) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn test_evict_empty_replacer() {
        let replacer = LruKReplacer::new(8, 2);
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_only_evictable_frames_are_candidates() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(2));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);

        replacer.set_evictable(fid(2), true).unwrap();
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_infinite_distance_ties_break_by_earliest_access() {
        // Frames 0, 1, 2 accessed once each at ticks 0, 1, 2; all have
        // infinite k-distance, so the oldest access goes first.
        let replacer = LruKReplacer::new(8, 2);
        for i in 0..3 {
            replacer.record_access(fid(i));
            replacer.set_evictable(fid(i), true).unwrap();
        }

        assert_eq!(replacer.evict(), Some(fid(0)));
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
    }

    #[test]
    fn test_largest_k_distance_is_evicted_first() {
        // Frame 0 accessed at ticks {0, 99}, frame 1 at {49, 59}: the wider
        // window loses.
        let replacer = LruKReplacer::new(8, 2);
        for tick in 0..100 {
            let frame = match tick {
                0 | 99 => fid(0),
                49 | 59 => fid(1),
                _ => fid(7),
            };
            replacer.record_access(frame);
        }
        replacer.set_evictable(fid(0), true).unwrap();
        replacer.set_evictable(fid(1), true).unwrap();

        assert_eq!(replacer.evict(), Some(fid(0)));
        assert_eq!(replacer.evict(), Some(fid(1)));
    }

    #[test]
    fn test_k_equals_one_degenerates_to_lru() {
        let replacer = LruKReplacer::new(8, 1);
        for i in 0..4 {
            replacer.record_access(fid(i));
            replacer.set_evictable(fid(i), true).unwrap();
        }
        // Re-access frame 0; it moves to the back of the order.
        replacer.record_access(fid(0));

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }

    #[test]
    fn test_set_evictable_is_idempotent() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));

        replacer.set_evictable(fid(1), true).unwrap();
        assert_eq!(replacer.size(), 1);
        replacer.set_evictable(fid(1), true).unwrap();
        assert_eq!(replacer.size(), 1);

        replacer.set_evictable(fid(1), false).unwrap();
        assert_eq!(replacer.size(), 0);
        replacer.set_evictable(fid(1), false).unwrap();
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_set_evictable_unknown_frame_fails() {
        let replacer = LruKReplacer::new(8, 2);
        let err = replacer.set_evictable(fid(3), true).unwrap_err();
        assert!(matches!(err, BufferError::FrameNotTracked { frame_id: 3 }));
    }

    #[test]
    fn test_remove_semantics() {
        let replacer = LruKReplacer::new(8, 2);

        // Unknown frame: silent no-op.
        replacer.remove(fid(5)).unwrap();

        // Non-evictable frame: error.
        replacer.record_access(fid(1));
        let err = replacer.remove(fid(1)).unwrap_err();
        assert!(matches!(err, BufferError::FrameNotEvictable { frame_id: 1 }));

        // Evictable frame: removed and size decremented.
        replacer.set_evictable(fid(1), true).unwrap();
        assert_eq!(replacer.size(), 1);
        replacer.remove(fid(1)).unwrap();
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_failed_evict_changes_nothing() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);

        replacer.set_evictable(fid(1), true).unwrap();
        assert_eq!(replacer.evict(), Some(fid(1)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_frame_id_panics() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(9));
    }

    #[test]
    fn test_boundary_frame_id_is_accepted() {
        let replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(8));
        replacer.set_evictable(fid(8), true).unwrap();
        assert_eq!(replacer.evict(), Some(fid(8)));
    }

    #[test]
    fn test_history_window_slides() {
        // Classic LRU-2 workout: six frames, one access each, then frame 1
        // gets a second access and survives the first round of evictions.
        let replacer = LruKReplacer::new(8, 2);
        for i in 1..=6 {
            replacer.record_access(fid(i));
        }
        for i in 1..=5 {
            replacer.set_evictable(fid(i), true).unwrap();
        }
        assert_eq!(replacer.size(), 5);

        replacer.record_access(fid(1));

        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.evict(), Some(fid(4)));
        assert_eq!(replacer.size(), 2);

        // Frames 3 and 4 return with fresh histories.
        replacer.record_access(fid(3));
        replacer.record_access(fid(4));
        replacer.record_access(fid(5));
        replacer.record_access(fid(4));
        replacer.set_evictable(fid(3), true).unwrap();
        replacer.set_evictable(fid(4), true).unwrap();
        assert_eq!(replacer.size(), 4);

        // Frame 3 has a single access on record, so it goes first.
        assert_eq!(replacer.evict(), Some(fid(3)));

        replacer.set_evictable(fid(6), true).unwrap();
        assert_eq!(replacer.evict(), Some(fid(6)));

        replacer.set_evictable(fid(1), false).unwrap();
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.evict(), Some(fid(5)));

        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true).unwrap();
        assert_eq!(replacer.size(), 2);

        assert_eq!(replacer.evict(), Some(fid(4)));
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
    }
}
