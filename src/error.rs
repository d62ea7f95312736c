//! Error types for configuration and arena-reservation failures.
//!
//! Contract violations — bad alignment, zero size, a foreign or
//! already-freed pointer handed to `deallocate`, counter underflow — are
//! deliberately *not* represented here. Per the error-handling design,
//! those are programmer bugs, not reportable conditions: they surface as
//! `assert!`/`debug_assert!` panics at the call site, the same way the
//! donor's `os.rs` and `segment.rs` use `debug_assert!`/`assert!` around
//! its own pointer and state invariants.

use thiserror::Error;

/// Failure reasons for [`crate::Segward::create`] and [`crate::Segward::create_in`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `segment_size`, rounded up to a power of two, falls outside `[4 KiB, 1 GiB]`.
    #[error("segment size {requested} (rounded up to {rounded}) is outside the allowed range [4 KiB, 1 GiB]")]
    SegmentSizeOutOfRange {
        /// The size requested by the caller, before rounding.
        requested: usize,
        /// The power-of-two size it rounded to.
        rounded: usize,
    },

    /// `total_size`, rounded up to a multiple of the segment size, yields
    /// fewer than 3 segments.
    #[error("total size yields only {segments} segment(s); at least 3 are required")]
    TooFewSegments {
        /// The segment count actually computed.
        segments: usize,
    },

    /// The backing arena could not reserve or commit the requested range.
    #[error("arena reservation failed: {0}")]
    Arena(#[from] ArenaError),
}

/// Failure reasons from the [`crate::arena::Arena`] abstraction.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Reserving address space failed outright (e.g. the platform refused
    /// the mapping, or address space is exhausted).
    #[error("failed to reserve {size} bytes of virtual address space")]
    ReserveFailed {
        /// Bytes that were requested.
        size: usize,
    },

    /// Committing (making resident/accessible) part of an already-reserved
    /// range failed.
    #[error("failed to commit {size} bytes at offset {offset}")]
    CommitFailed {
        /// Byte offset within the arena where the commit was attempted.
        offset: usize,
        /// Number of bytes that failed to commit.
        size: usize,
    },
}
