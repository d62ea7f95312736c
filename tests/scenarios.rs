//! Concrete allocate/deallocate scenarios, run against the heap-backed
//! arena so they don't need real OS memory mappings.

use segward::{HeapArena, Segward, SegmentState, SegwardConfig};

const KB: usize = 1024;

fn heap(segment_size: usize, segment_count: usize) -> Segward<HeapArena> {
    Segward::create_in(segment_size, segment_size * segment_count, SegwardConfig::default())
        .expect("valid configuration")
}

#[test]
fn single_allocation_round_trips() {
    let mut arena = heap(64 * KB, 3);
    let ptr = arena.allocate(256, 8).expect("room in a fresh segment");
    assert_eq!(arena.segment_of(ptr), Some(0));
    assert_eq!(arena.live_allocations(0), 1);

    unsafe { arena.deallocate(ptr) };
    assert_eq!(arena.live_allocations(0), 0);
    assert_eq!(arena.segment_state(0), SegmentState::Retired);
}

#[test]
fn every_legal_alignment_is_honored() {
    // segment_size = 1 MiB puts the alignment cap (segment_size / 256) at
    // 4096, which covers every power of two in this grid.
    let mut arena = heap(1024 * KB, 3);
    for &align in &[8usize, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096] {
        let ptr = arena.allocate(32, align).expect("segment has room");
        assert_eq!(
            (ptr as usize) % align,
            0,
            "pointer {ptr:?} not aligned to {align}"
        );
    }
}

#[test]
fn filling_a_segment_rolls_over_to_the_next() {
    let mut arena = heap(64 * KB, 3);
    arena.allocate(14 * KB, 8).unwrap();
    arena.allocate(16 * KB, 8).unwrap();
    arena.allocate(16 * KB, 8).unwrap();
    arena.allocate(16 * KB, 8).unwrap();
    assert_eq!(arena.current_segment(), 0);

    // 62 KiB used; a further 4 KiB request doesn't fit and rolls the
    // allocator onto segment 1 at offset 0.
    let ptr = arena.allocate(4 * KB, 8).unwrap();
    assert_eq!(arena.current_segment(), 1);
    assert_eq!(arena.segment_of(ptr), Some(1));
    assert_eq!(arena.segment_state(0), SegmentState::Full);
}

#[test]
fn out_of_memory_then_recovery_after_a_segment_drains() {
    let mut arena = heap(64 * KB, 3);
    let per_segment = (64 * KB) / 256; // 256 allocations of 256 bytes each

    let mut segment_one_ptrs = Vec::new();
    let mut count = 0;
    loop {
        match arena.allocate(256, 256) {
            Some(ptr) => {
                if arena.segment_of(ptr) == Some(1) {
                    segment_one_ptrs.push(ptr);
                }
                count += 1;
            }
            None => break,
        }
    }

    assert_eq!(count, per_segment * 3);
    assert_eq!(arena.stats().out_of_memory_events, 0);
    assert!(arena.allocate(256, 256).is_none());
    assert_eq!(arena.stats().out_of_memory_events, 1);

    // draining segment 1 entirely retires it and makes it available again.
    for ptr in segment_one_ptrs {
        unsafe { arena.deallocate(ptr) };
    }
    assert_eq!(arena.segment_state(1), SegmentState::Retired);

    let ptr = arena.allocate(2048, 256).expect("segment 1 was reclaimed");
    assert_eq!(arena.segment_of(ptr), Some(1));
}

#[test]
fn interleaved_frees_across_segments_retire_independently() {
    let mut arena = heap(64 * KB, 3);
    let a = arena.allocate(40 * KB, 8).unwrap();
    let b = arena.allocate(40 * KB, 8).unwrap(); // doesn't fit after a, rolls onto segment 1
    assert_eq!(arena.segment_of(a), Some(0));
    assert_eq!(arena.segment_of(b), Some(1));

    let c = arena.allocate(8 * KB, 8).unwrap(); // fits in segment 1 alongside b
    assert_eq!(arena.segment_of(c), Some(1));

    unsafe { arena.deallocate(a) };
    assert_eq!(arena.segment_state(0), SegmentState::Retired);
    assert_eq!(arena.segment_state(1), SegmentState::Active);
    assert_eq!(arena.live_allocations(1), 2);

    unsafe { arena.deallocate(b) };
    assert_eq!(arena.segment_state(1), SegmentState::Active);
    assert_eq!(arena.live_allocations(1), 1);

    unsafe { arena.deallocate(c) };
    assert_eq!(arena.segment_state(1), SegmentState::Retired);
}

#[test]
#[should_panic(expected = "exceeds the cap")]
fn over_aligned_requests_are_rejected() {
    let mut arena = heap(64 * KB, 3);
    arena.allocate(8, 4096); // cap for a 64 KiB segment is 256
}
