//! Deterministic hashing for index placement.

use std::hash::BuildHasher;

use siphasher::sip::SipHasher13;

// Fixed SipHash keys; bucket placement must not change between runs.
const SEED_K0: u64 = 0x517c_c1b7_2722_0a95;
const SEED_K1: u64 = 0x0fc9_4dc6_e6eb_8a5f;

/// A [`BuildHasher`] producing SipHash-1-3 hashers with fixed keys.
///
/// The standard library's `RandomState` reseeds every process, which would
/// reshuffle directory placement between runs of the same workload. This
/// state hashes identically everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicState;

impl BuildHasher for DeterministicState {
    type Hasher = SipHasher13;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        SipHasher13::new_with_keys(SEED_K0, SEED_K1)
    }
}
