//! Running allocation counters, mirroring the counter/peak-tracking style
//! of the donor crate's own `stats` module (there: per-category
//! `StatCount { allocated, freed, peak, current }` pairs updated with
//! `fetch_add`/`fetch_max`-style atomics).
//!
//! Segward itself is single-threaded (see the concurrency notes on
//! [`crate::Segward`]); these use atomics only so a snapshot can be taken
//! through a shared reference, not for cross-thread coordination.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for a single [`crate::Segward`] instance.
#[derive(Default)]
pub struct AllocatorStats {
    allocations: AtomicU64,
    deallocations: AtomicU64,
    bytes_allocated: AtomicU64,
    segments_activated: AtomicU64,
    segments_retired: AtomicU64,
    out_of_memory_events: AtomicU64,
}

impl AllocatorStats {
    pub(crate) fn record_allocation(&self, size: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_allocated.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_deallocation(&self) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_activation(&self) {
        self.segments_activated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retirement(&self) {
        self.segments_retired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_oom(&self) {
        self.out_of_memory_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of the current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            segments_activated: self.segments_activated.load(Ordering::Relaxed),
            segments_retired: self.segments_retired.load(Ordering::Relaxed),
            out_of_memory_events: self.out_of_memory_events.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`AllocatorStats`], returned by [`crate::Segward::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Total successful `allocate` calls.
    pub allocations: u64,
    /// Total `deallocate` calls.
    pub deallocations: u64,
    /// Sum of (post-normalization) requested sizes across all allocations.
    pub bytes_allocated: u64,
    /// Number of times a segment transitioned `EMPTY`/`RETIRED` -> `ACTIVE`.
    pub segments_activated: u64,
    /// Number of times a segment transitioned to `RETIRED` (counter drained to zero).
    pub segments_retired: u64,
    /// Number of `allocate` calls that returned `None` because no
    /// replacement segment was available.
    pub out_of_memory_events: u64,
}
