//! A forward-segmented bump allocator.
//!
//! The reserved address range is split into fixed-size segments, each an
//! independent bump arena with its own live-allocation counter. A segment
//! moves `EMPTY -> ACTIVE -> FULL -> RETIRED -> ACTIVE ...` as allocations
//! and deallocations land on it; `allocate` never has to scan or compact,
//! it either fits in the current segment or hands off to the next
//! `EMPTY`/`RETIRED` one.
//!
//! ```
//! use segward::{Segward, HeapArena};
//!
//! let mut arena: Segward<HeapArena> =
//!     Segward::create_in(64 * 1024, 3 * 64 * 1024, Default::default()).unwrap();
//! let ptr = arena.allocate(256, 8).expect("segment has room");
//! unsafe { arena.deallocate(ptr) };
//! ```

mod allocator;
mod arena;
mod config;
mod error;
mod segment;
mod stats;
mod util;

pub use allocator::Segward;
pub use arena::{Arena, HeapArena, VirtualArena};
pub use config::SegwardConfig;
pub use error::{ArenaError, ConfigError};
pub use segment::SegmentState;
pub use stats::StatsSnapshot;
