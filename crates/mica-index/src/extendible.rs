//! Extendible hash table with lazy bucket splitting.
//!
//! A power-of-two directory maps the low-order bits of a key's hash to a
//! bucket. Each bucket discriminates on its own number of bits (its local
//! depth, at most the directory's global depth), so one bucket may back
//! several directory slots. A full bucket splits in two; when its new local
//! depth would exceed the global depth, the directory doubles. Buckets are
//! never merged.
//!
//! Lookups cost O(bucket_size) regardless of table size, which is what the
//! buffer pool needs from its page table.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

use crate::hasher::DeterministicState;

/// Default number of entries a bucket holds before it splits.
pub const DEFAULT_BUCKET_SIZE: usize = 4;

/// A bounded list of entries that all share the low `depth` bits of their
/// hash.
#[derive(Debug)]
struct Bucket<K, V> {
    depth: usize,
    entries: Vec<(K, V)>,
}

impl<K: Eq, V> Bucket<K, V> {
    fn new(depth: usize, capacity: usize) -> Self {
        Self {
            depth,
            entries: Vec::with_capacity(capacity),
        }
    }

    fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Directory plus bucket arena; everything the table latch protects.
#[derive(Debug)]
struct TableState<K, V> {
    global_depth: usize,
    /// `slots[i]` indexes into `buckets`; a bucket may back several slots.
    slots: Vec<usize>,
    buckets: Vec<Bucket<K, V>>,
}

/// Extendible hash table keyed by a deterministic hash of `K`.
///
/// All operations go through a single internal latch, so the table is safe
/// to share across threads behind `&self`.
///
/// # Example
///
/// ```rust
/// use mica_index::ExtendibleHashTable;
///
/// let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(2);
/// for i in 0..16 {
///     table.insert(i, i * 10);
/// }
/// assert_eq!(table.get(&7), Some(70));
/// assert!(table.num_buckets() > 1);
/// ```
pub struct ExtendibleHashTable<K, V, S = DeterministicState> {
    bucket_size: usize,
    hash_builder: S,
    state: Mutex<TableState<K, V>>,
}

impl<K: Hash + Eq, V> ExtendibleHashTable<K, V> {
    /// Creates a table whose buckets hold up to `bucket_size` entries.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, DeterministicState)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ExtendibleHashTable<K, V, S> {
    /// Creates a table that hashes keys with the supplied state.
    pub fn with_hasher(bucket_size: usize, hash_builder: S) -> Self {
        let bucket_size = bucket_size.max(1);
        Self {
            bucket_size,
            hash_builder,
            state: Mutex::new(TableState {
                global_depth: 0,
                slots: vec![0],
                buckets: vec![Bucket::new(0, bucket_size)],
            }),
        }
    }

    /// Directory slot for `key` under the current global depth.
    fn slot_of(&self, state: &TableState<K, V>, key: &K) -> usize {
        let mask = (1usize << state.global_depth) - 1;
        (self.hash_builder.hash_one(key) as usize) & mask
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let state = self.state.lock();
        let slot = self.slot_of(&state, key);
        state.buckets[state.slots[slot]]
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        let state = self.state.lock();
        let slot = self.slot_of(&state, key);
        state.buckets[state.slots[slot]]
            .entries
            .iter()
            .any(|(k, _)| k == key)
    }

    /// Removes the entry stored under `key`, returning whether one existed.
    pub fn remove(&self, key: &K) -> bool {
        let mut state = self.state.lock();
        let slot = self.slot_of(&state, key);
        let idx = state.slots[slot];
        let bucket = &mut state.buckets[idx];
        match bucket.entries.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                bucket.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Inserts `(key, value)`, overwriting the value of an equal key.
    ///
    /// A full bucket splits, possibly doubling the directory; the split
    /// repeats along the key's path until the entry fits. Keys whose hashes
    /// agree on every low bit cannot be separated by splitting, so
    /// `bucket_size` identical-hash keys is the practical occupancy limit.
    pub fn insert(&self, key: K, value: V) {
        let mut state = self.state.lock();
        self.insert_internal(&mut state, key, value);
    }

    fn insert_internal(&self, state: &mut TableState<K, V>, key: K, value: V) {
        let slot = self.slot_of(state, &key);
        let idx = state.slots[slot];

        if let Some(existing) = state.buckets[idx].find_mut(&key) {
            *existing = value;
            return;
        }
        if state.buckets[idx].entries.len() < self.bucket_size {
            state.buckets[idx].entries.push((key, value));
            return;
        }

        // Split: the full bucket stays as the 0-side at depth + 1, and a
        // fresh bucket becomes the 1-side.
        let depth = state.buckets[idx].depth;
        let new_idx = state.buckets.len();
        state.buckets.push(Bucket::new(depth + 1, self.bucket_size));
        state.buckets[idx].depth = depth + 1;

        if depth + 1 > state.global_depth {
            // The directory doubles; the upper half starts as a mirror of
            // the lower, then the split bucket's new alias flips sides.
            let old_len = state.slots.len();
            state.global_depth += 1;
            state.slots.extend_from_within(..);
            state.slots[slot + old_len] = new_idx;
        } else {
            // Rewire every alias of the split bucket: bit `depth` of the
            // slot index picks the side.
            let stride = 1usize << depth;
            let mut j = slot & (stride - 1);
            while j < state.slots.len() {
                state.slots[j] = if j & stride == 0 { idx } else { new_idx };
                j += stride;
            }
        }

        // Displaced entries re-route through the updated directory, the
        // pending pair last.
        let displaced = std::mem::take(&mut state.buckets[idx].entries);
        for (k, v) in displaced {
            self.insert_internal(state, k, v);
        }
        self.insert_internal(state, key, value);
    }

    /// Number of hash bits the directory currently discriminates on.
    pub fn global_depth(&self) -> usize {
        self.state.lock().global_depth
    }

    /// Local depth of the bucket backing directory slot `dir_index`.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is outside the current directory.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let state = self.state.lock();
        state.buckets[state.slots[dir_index]].depth
    }

    /// Number of distinct bucket instances.
    pub fn num_buckets(&self) -> usize {
        self.state.lock().buckets.len()
    }

    /// Number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .buckets
            .iter()
            .map(|b| b.entries.len())
            .sum()
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bucket capacity this table was built with.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }
}

impl<K, V, S> fmt::Debug for ExtendibleHashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &state.global_depth)
            .field("num_buckets", &state.buckets.len())
            .field("directory_size", &state.slots.len())
            .field("bucket_size", &self.bucket_size)
            .finish()
    }
}
