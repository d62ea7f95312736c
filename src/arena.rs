//! The `Arena` abstraction: a reserve-then-commit virtual memory region
//! handed to [`crate::Segward`] as raw, zero-initialized bytes.
//!
//! `spec.md` §3 treats the arena as an external collaborator the allocator
//! doesn't own the implementation of; this module is that collaborator,
//! in the style of the donor's `os.rs` (which wraps the same mmap/
//! VirtualAlloc primitives directly inline). Two implementations are
//! provided: [`VirtualArena`], backed by real OS virtual memory, and
//! [`HeapArena`], backed by a plain heap allocation, for tests that want
//! to run fast and without touching the OS.

use crate::error::ArenaError;

/// A contiguous, reserved byte range that can be grown (committed) on
/// demand, in page- or segment-sized increments.
///
/// Implementors guarantee that bytes in `[0, committed)` are readable and
/// writable and read as zero the first time they're committed; bytes in
/// `[committed, len)` are reserved address space only.
pub trait Arena {
    /// Reserve `len` bytes of address space and eagerly commit the first
    /// `initial_commit` bytes of it.
    fn create(len: usize, initial_commit: usize) -> Result<Self, ArenaError>
    where
        Self: Sized;

    /// Grow the committed region so that at least `up_to` bytes (from the
    /// start of the arena) are committed. A no-op if already satisfied.
    fn commit_up_to(&mut self, up_to: usize) -> Result<(), ArenaError>;

    /// Base address of the reserved region.
    fn base(&self) -> *mut u8;

    /// Total reserved length in bytes.
    fn len(&self) -> usize;

    /// Bytes currently committed, starting from `base()`.
    fn committed(&self) -> usize;
}

/// Real OS virtual memory: `mmap`/`mprotect`/`munmap` on Unix,
/// `VirtualAlloc`/`VirtualFree` on Windows.
///
/// This is the `Arena` a production [`crate::Segward`] is built with
/// ([`crate::Segward::create`] defaults to it); address space is reserved
/// once at construction and grown by committing additional pages as the
/// bump cursor advances into them, matching the donor's incremental
/// `mi_os_commit` pattern rather than committing the whole range up
/// front.
pub struct VirtualArena {
    base: *mut u8,
    len: usize,
    committed: usize,
}

// SAFETY: the raw pointer is a unique owner of an OS mapping; `VirtualArena`
// does not expose shared mutable aliasing of that memory itself (the
// allocator built on top of it is responsible for that).
unsafe impl Send for VirtualArena {}

impl Arena for VirtualArena {
    fn create(len: usize, initial_commit: usize) -> Result<Self, ArenaError> {
        debug_assert!(initial_commit <= len);
        let base = os::reserve(len)?;
        let mut arena = Self {
            base,
            len,
            committed: 0,
        };
        if initial_commit > 0 {
            arena.commit_up_to(initial_commit)?;
        }
        Ok(arena)
    }

    fn commit_up_to(&mut self, up_to: usize) -> Result<(), ArenaError> {
        let up_to = up_to.min(self.len);
        if up_to <= self.committed {
            return Ok(());
        }
        let offset = self.committed;
        let size = up_to - offset;
        // SAFETY: `base + offset` is within the reserved `[base, base+len)`
        // range by the `up_to.min(self.len)` clamp above.
        unsafe { os::commit(self.base, offset, size)? };
        self.committed = up_to;
        Ok(())
    }

    fn base(&self) -> *mut u8 {
        self.base
    }

    fn len(&self) -> usize {
        self.len
    }

    fn committed(&self) -> usize {
        self.committed
    }
}

impl Drop for VirtualArena {
    fn drop(&mut self) {
        // SAFETY: `base` was obtained from `os::reserve(self.len)` and is
        // not released anywhere else.
        unsafe { os::release(self.base, self.len) };
    }
}

/// A plain heap-backed arena: the whole range is allocated and zeroed up
/// front, `commit_up_to` is a no-op bookkeeping update.
///
/// Used by the test suite ([`tests/invariants.rs`] and friends) so
/// property tests can run thousands of alloc/dealloc sequences without
/// paying for real `mmap` syscalls, and so they run identically under
/// Miri or on platforms without the full `VirtualArena` OS support.
pub struct HeapArena {
    storage: Box<[u8]>,
    committed: usize,
}

impl Arena for HeapArena {
    fn create(len: usize, initial_commit: usize) -> Result<Self, ArenaError> {
        debug_assert!(initial_commit <= len);
        Ok(Self {
            storage: vec![0u8; len].into_boxed_slice(),
            committed: initial_commit,
        })
    }

    fn commit_up_to(&mut self, up_to: usize) -> Result<(), ArenaError> {
        self.committed = self.committed.max(up_to.min(self.storage.len()));
        Ok(())
    }

    fn base(&self) -> *mut u8 {
        self.storage.as_ptr() as *mut u8
    }

    fn len(&self) -> usize {
        self.storage.len()
    }

    fn committed(&self) -> usize {
        self.committed
    }
}

#[cfg(not(windows))]
mod os {
    use crate::error::ArenaError;
    use errno::errno;
    use libc::{
        mmap, mprotect, munmap, MAP_ANON, MAP_FAILED, MAP_PRIVATE, PROT_NONE, PROT_READ,
        PROT_WRITE,
    };
    use log::warn;
    use std::ffi::c_void;
    use std::ptr::null_mut;

    pub(super) fn reserve(len: usize) -> Result<*mut u8, ArenaError> {
        // SAFETY: a fixed, well-formed set of mmap arguments requesting an
        // anonymous, inaccessible (PROT_NONE) private mapping.
        let ptr = unsafe {
            mmap(
                null_mut(),
                len,
                PROT_NONE,
                MAP_PRIVATE | MAP_ANON,
                -1,
                0,
            )
        };
        if ptr == MAP_FAILED {
            warn!("mmap reserve of {len} bytes failed: errno {}", errno());
            return Err(ArenaError::ReserveFailed { size: len });
        }
        Ok(ptr as *mut u8)
    }

    /// # Safety
    /// `base + offset` through `base + offset + size` must lie within a
    /// range previously returned by `reserve`.
    pub(super) unsafe fn commit(base: *mut u8, offset: usize, size: usize) -> Result<(), ArenaError> {
        let addr = base.add(offset) as *mut c_void;
        let rc = mprotect(addr, size, PROT_READ | PROT_WRITE);
        if rc != 0 {
            warn!(
                "mprotect commit of {size} bytes at offset {offset} failed: errno {}",
                errno()
            );
            return Err(ArenaError::CommitFailed { offset, size });
        }
        Ok(())
    }

    /// # Safety
    /// `base` must have been returned by `reserve(len)` and not yet released.
    pub(super) unsafe fn release(base: *mut u8, len: usize) {
        if munmap(base as *mut c_void, len) != 0 {
            warn!("munmap of {len} bytes failed: errno {}", errno());
        }
    }
}

#[cfg(windows)]
mod os {
    use crate::error::ArenaError;
    use log::warn;
    use std::ptr::null_mut;
    use winapi::um::memoryapi::{VirtualAlloc, VirtualFree};
    use winapi::um::winnt::{MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_NOACCESS, PAGE_READWRITE};

    pub(super) fn reserve(len: usize) -> Result<*mut u8, ArenaError> {
        // SAFETY: a fixed, well-formed set of VirtualAlloc arguments
        // requesting a reserved-only (PAGE_NOACCESS), uncommitted region.
        let ptr = unsafe { VirtualAlloc(null_mut(), len, MEM_RESERVE, PAGE_NOACCESS) };
        if ptr.is_null() {
            warn!("VirtualAlloc reserve of {len} bytes failed: error {}", unsafe {
                winapi::um::errhandlingapi::GetLastError()
            });
            return Err(ArenaError::ReserveFailed { size: len });
        }
        Ok(ptr as *mut u8)
    }

    /// # Safety
    /// `base + offset` through `base + offset + size` must lie within a
    /// range previously returned by `reserve`.
    pub(super) unsafe fn commit(base: *mut u8, offset: usize, size: usize) -> Result<(), ArenaError> {
        let addr = base.add(offset) as *mut _;
        let ptr = VirtualAlloc(addr, size, MEM_COMMIT, PAGE_READWRITE);
        if ptr.is_null() {
            warn!(
                "VirtualAlloc commit of {size} bytes at offset {offset} failed: error {}",
                winapi::um::errhandlingapi::GetLastError()
            );
            return Err(ArenaError::CommitFailed { offset, size });
        }
        Ok(())
    }

    /// # Safety
    /// `base` must have been returned by `reserve` and not yet released.
    pub(super) unsafe fn release(base: *mut u8, _len: usize) {
        if VirtualFree(base as *mut _, 0, MEM_RELEASE) == 0 {
            warn!("VirtualFree failed: error {}", winapi::um::errhandlingapi::GetLastError());
        }
    }
}
