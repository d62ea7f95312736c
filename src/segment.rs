//! The segment table: three parallel arrays indexed by segment id, and the
//! `EMPTY -> ACTIVE -> FULL -> RETIRED -> ACTIVE ...` state machine that
//! drives them.
//!
//! Kept as structure-of-arrays rather than an array of structs, on purpose
//! (see the design notes on [`crate::Segward`]): the replacement search in
//! `allocate()` does a linear scan over `states` alone, and SoA keeps that
//! scan from dragging unrelated counter/cursor bytes through cache.

/// The four-valued segment state.
///
/// `Empty` and `Retired` are equivalent candidates for the replacement
/// search (the linear scan in `allocate()` that picks the next segment to
/// activate); `Active` is the current bump-allocation target; `Full`
/// holds live data but accepts no new allocations until it drains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SegmentState {
    /// Never used, or never used since the arena was created.
    #[default]
    Empty,
    /// The current (or a past) bump-allocation target; `counter` may be
    /// zero (just activated) or positive.
    Active,
    /// Filled up while still holding live allocations.
    Full,
    /// Drained back to zero live allocations after having held data.
    Retired,
}

/// The segment table: `counters[i]` (live allocations), `cursors[i]`
/// (bump offset within the segment), `states[i]` (the state above).
pub(crate) struct SegmentTable {
    counters: Vec<i32>,
    cursors: Vec<u32>,
    states: Vec<SegmentState>,
}

impl SegmentTable {
    pub(crate) fn new(segment_count: usize) -> Self {
        Self {
            counters: vec![0; segment_count],
            cursors: vec![0; segment_count],
            states: vec![SegmentState::default(); segment_count],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn state(&self, seg: usize) -> SegmentState {
        self.states[seg]
    }

    pub(crate) fn cursor(&self, seg: usize) -> u32 {
        self.cursors[seg]
    }

    pub(crate) fn counter(&self, seg: usize) -> i32 {
        self.counters[seg]
    }

    /// `ACTIVE -> FULL`: the attempted allocation doesn't fit.
    ///
    /// Invariant 4 of `spec.md` §3/§8 requires `counters[seg] > 0` here:
    /// a segment only fills while still holding live allocations,
    /// otherwise it would have gone straight to `RETIRED`.
    pub(crate) fn mark_full(&mut self, seg: usize) {
        debug_assert!(
            self.counters[seg] > 0,
            "segment {seg} marked FULL with no live allocations"
        );
        self.states[seg] = SegmentState::Full;
    }

    /// `EMPTY`/`RETIRED` -> `ACTIVE`: chosen by the replacement search.
    pub(crate) fn activate(&mut self, seg: usize) {
        debug_assert_eq!(self.cursors[seg], 0, "segment {seg} activated with a nonzero cursor");
        debug_assert_eq!(self.counters[seg], 0, "segment {seg} activated with live allocations");
        self.states[seg] = SegmentState::Active;
    }

    /// Record a successful bump allocation: advance the cursor, bump the
    /// live-allocation counter.
    pub(crate) fn record_allocation(&mut self, seg: usize, new_cursor: u32) {
        self.cursors[seg] = new_cursor;
        self.counters[seg] += 1;
    }

    /// Decrement the live-allocation counter for `seg`; retires it
    /// (resetting the cursor to zero) when the counter drains to zero.
    ///
    /// Returns `true` iff this call retired the segment.
    pub(crate) fn record_deallocation(&mut self, seg: usize) -> bool {
        debug_assert!(self.counters[seg] > 0, "counter underflow on segment {seg}");
        self.counters[seg] -= 1;
        if self.counters[seg] == 0 {
            self.states[seg] = SegmentState::Retired;
            self.cursors[seg] = 0;
            true
        } else {
            false
        }
    }

    /// The replacement search: the lowest-indexed `EMPTY` or `RETIRED`
    /// segment, or `None` if every segment is `ACTIVE`/`FULL`
    /// (out-of-memory).
    ///
    /// Deterministic by construction (`Vec::iter().position()` scans in
    /// index order), which is what makes two identical call sequences
    /// from a single thread produce identical pointer sequences.
    pub(crate) fn find_replacement(&self) -> Option<usize> {
        self.states
            .iter()
            .position(|s| matches!(s, SegmentState::Empty | SegmentState::Retired))
    }
}
