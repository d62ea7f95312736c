//! Tunable construction-time behavior for [`crate::Segward`].
//!
//! The donor crate's `lib.rs` references a `mod options;` (mirroring real
//! mimalloc's `option_is_enabled`/`option_get` tuning flags) that did not
//! make it into this retrieval. This module reconstructs that concern as a
//! plain, validated-at-construction config struct, in the style of
//! `murk-arena`'s `ArenaConfig`: documented defaults, a `Default` impl, and
//! no hidden global state.

/// Construction-time knobs for a [`crate::Segward`] allocator.
#[derive(Clone, Copy, Debug)]
pub struct SegwardConfig {
    /// Number of segments to eagerly commit at `create()` time, rather
    /// than leaving them reserved-but-uncommitted until the bump cursor
    /// actually reaches them.
    ///
    /// This mirrors the reference implementation's
    /// `min_segments * segment_size` eager-commit size passed to the
    /// arena's `create(total_size, initial_commit_size)`. Clamped to
    /// `[3, segment_count]` at construction time, so the minimum viable
    /// allocator (3 segments) is always fully committed up front.
    ///
    /// Default: `3`.
    pub eager_commit_segments: usize,
}

impl SegwardConfig {
    /// The minimum number of segments every `Segward` instance has
    /// (see `spec.md` §3 invariant 2: `N >= 3`).
    pub const MIN_SEGMENTS: usize = 3;
}

impl Default for SegwardConfig {
    fn default() -> Self {
        Self {
            eager_commit_segments: Self::MIN_SEGMENTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eagerly_commits_minimum_segments() {
        assert_eq!(SegwardConfig::default().eager_commit_segments, 3);
    }
}
