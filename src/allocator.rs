//! [`Segward`]: the forward-segmented bump allocator itself.

use log::{debug, trace, warn};

use crate::arena::{Arena, VirtualArena};
use crate::config::SegwardConfig;
use crate::error::ConfigError;
use crate::segment::{SegmentState, SegmentTable};
use crate::stats::{AllocatorStats, StatsSnapshot};
use crate::util::align_up;

/// Every request is rounded up to a multiple of this many bytes, matching
/// the donor's own small-object quantum.
const QUANTUM: usize = 8;

const MIN_SEGMENT_SIZE: usize = 4 * 1024;
const MAX_SEGMENT_SIZE: usize = 1024 * 1024 * 1024;

/// A forward-segmented bump allocator: a reserved region divided into
/// `segment_count` equally-sized segments, each bump-allocated
/// independently and tracked through the `EMPTY -> ACTIVE -> FULL ->
/// RETIRED -> ACTIVE` state machine in [`SegmentTable`].
///
/// Generic over the backing [`Arena`] so tests can swap in [`crate::HeapArena`]
/// without touching the allocation logic; production code gets
/// [`VirtualArena`] by default.
///
/// Not `Sync`: the bump cursor and segment table are mutated without
/// synchronization, exactly like the donor's per-thread segment design.
/// Give each thread its own `Segward`, the same way the donor gives each
/// thread its own heap.
pub struct Segward<A: Arena = VirtualArena> {
    arena: A,
    table: SegmentTable,
    base: *mut u8,
    segment_count: usize,
    segment_shift: u32,
    current_segment: usize,
    stats: AllocatorStats,
}

impl Segward<VirtualArena> {
    /// Create an allocator backed by real OS virtual memory.
    ///
    /// `segment_size` is rounded up to the nearest power of two in
    /// `[4 KiB, 1 GiB]`; `total_size` is rounded up to a multiple of that
    /// and must yield at least 3 segments.
    pub fn create(segment_size: usize, total_size: usize) -> Result<Self, ConfigError> {
        Self::create_with_config(segment_size, total_size, SegwardConfig::default())
    }

    /// Like [`Self::create`], with explicit construction-time tuning.
    pub fn create_with_config(
        segment_size: usize,
        total_size: usize,
        config: SegwardConfig,
    ) -> Result<Self, ConfigError> {
        Self::create_in(segment_size, total_size, config)
    }
}

impl<A: Arena> Segward<A> {
    /// Like [`Segward::create`], generic over the backing arena
    /// implementation. Used directly by tests to build a
    /// `Segward<HeapArena>`.
    pub fn create_in(
        segment_size: usize,
        total_size: usize,
        config: SegwardConfig,
    ) -> Result<Self, ConfigError> {
        let rounded = segment_size.next_power_of_two();
        if !(MIN_SEGMENT_SIZE..=MAX_SEGMENT_SIZE).contains(&rounded) {
            return Err(ConfigError::SegmentSizeOutOfRange {
                requested: segment_size,
                rounded,
            });
        }

        let total = align_up(total_size, rounded);
        let segment_count = total / rounded;
        if segment_count < SegwardConfig::MIN_SEGMENTS {
            return Err(ConfigError::TooFewSegments {
                segments: segment_count,
            });
        }

        let eager = config
            .eager_commit_segments
            .clamp(SegwardConfig::MIN_SEGMENTS, segment_count);

        let arena = A::create(total, eager * rounded)?;
        let base = arena.base();

        let mut table = SegmentTable::new(segment_count);
        table.activate(0);

        let stats = AllocatorStats::default();
        stats.record_activation();

        // per-segment bookkeeping if it lived in the arena: 4 (counter) +
        // 4 (cursor) + 1 (state tag) bytes. Kept only as a diagnostic —
        // the tables are plain `Vec`s, not arena-carved.
        let bookkeeping_footprint = segment_count * (4 + 4 + 1);
        debug!(
            "segward created: {segment_count} segments of {rounded} bytes each, {eager} eagerly committed, {bookkeeping_footprint} bytes of equivalent bookkeeping"
        );

        Ok(Self {
            arena,
            table,
            base,
            segment_count,
            segment_shift: rounded.trailing_zeros(),
            current_segment: 0,
            stats,
        })
    }

    fn segment_size(&self) -> usize {
        1usize << self.segment_shift
    }

    /// Total number of segments in this allocator.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Index of the segment currently receiving new allocations.
    pub fn current_segment(&self) -> usize {
        self.current_segment
    }

    /// State of segment `seg`.
    pub fn segment_state(&self, seg: usize) -> SegmentState {
        self.table.state(seg)
    }

    /// Live allocation count of segment `seg`.
    pub fn live_allocations(&self, seg: usize) -> i32 {
        self.table.counter(seg)
    }

    /// Running counters for this allocator instance.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Which segment owns `ptr`, or `None` if `ptr` falls outside this
    /// allocator's reserved range entirely.
    pub fn segment_of(&self, ptr: *const u8) -> Option<usize> {
        let base = self.base as usize;
        let addr = ptr as usize;
        if addr < base {
            return None;
        }
        let offset = addr - base;
        if offset >= self.segment_count * self.segment_size() {
            return None;
        }
        Some(offset >> self.segment_shift)
    }

    /// Allocate `size` bytes aligned to `align` (a power of two).
    ///
    /// Returns `None` if every segment is `ACTIVE`/`FULL` and none can be
    /// reclaimed (out of memory), or if the backing arena fails to commit
    /// the pages the allocation needs.
    ///
    /// # Panics
    /// Panics if `size` is zero, `align` is not a power of two, or
    /// `align` exceeds `segment_size / 256` — the same alignment cap the
    /// reference implementation enforces, since an over-aligned request
    /// can never be satisfied by a bump cursor inside a fixed-size
    /// segment.
    pub fn allocate(&mut self, size: usize, align: usize) -> Option<*mut u8> {
        assert!(size > 0, "allocation size must be nonzero");
        assert!(align.is_power_of_two(), "alignment must be a power of two, got {align}");
        let cap = self.segment_size() >> 8;
        assert!(
            align <= cap,
            "alignment {align} exceeds the cap of {cap} for segment size {}",
            self.segment_size()
        );

        let size = align_up(size, QUANTUM);
        // alignment below the quantum can't do anything useful: every
        // bump offset is already a multiple of 8.
        let align = align.max(QUANTUM);

        loop {
            let seg = self.current_segment;
            let cursor = self.table.cursor(seg) as usize;
            let aligned_cursor = align_up(cursor, align);
            let end = aligned_cursor + size;

            if end <= self.segment_size() {
                let seg_base = seg * self.segment_size();
                if let Err(err) = self.arena.commit_up_to(seg_base + end) {
                    warn!("commit failed during allocate: {err}");
                    self.stats.record_oom();
                    return None;
                }
                // SAFETY: `seg_base + aligned_cursor` is within
                // `[0, segment_count * segment_size)`, which was just
                // committed above.
                let ptr = unsafe { self.base.add(seg_base + aligned_cursor) };
                self.table.record_allocation(seg, end as u32);
                self.stats.record_allocation(size);
                trace!("segment {seg}: allocated {size} bytes at offset {aligned_cursor}");
                return Some(ptr);
            }

            self.table.mark_full(seg);
            debug!("segment {seg} full");
            match self.table.find_replacement() {
                Some(next) => {
                    self.table.activate(next);
                    self.current_segment = next;
                    self.stats.record_activation();
                    debug!("segment {next} activated");
                }
                None => {
                    warn!("out of memory: no empty or retired segment available");
                    self.stats.record_oom();
                    return None;
                }
            }
        }
    }

    /// Release the allocation at `ptr`.
    ///
    /// # Safety
    /// `ptr` must have been returned by a prior call to [`Self::allocate`]
    /// on this same allocator, and must not already have been
    /// deallocated.
    ///
    /// # Panics
    /// Panics if `ptr` does not belong to this allocator's reserved
    /// range, or if its segment has no live allocations to release
    /// (double free).
    pub unsafe fn deallocate(&mut self, ptr: *mut u8) {
        let seg = self
            .segment_of(ptr)
            .expect("pointer does not belong to this allocator");
        assert!(
            matches!(self.table.state(seg), SegmentState::Active | SegmentState::Full),
            "double free or invalid pointer in segment {seg}"
        );

        self.stats.record_deallocation();
        if self.table.record_deallocation(seg) {
            self.stats.record_retirement();
            trace!("segment {seg} retired");
        }
    }

    /// Consume the allocator, releasing its backing memory.
    ///
    /// Equivalent to dropping it; kept as an explicit method for callers
    /// that want release to read as a deliberate step in their own code.
    pub fn destroy(self) {}
}

impl<A: Arena> Drop for Segward<A> {
    fn drop(&mut self) {
        trace!("segward destroyed: {} segments", self.segment_count);
    }
}
