//! Property-based replay of random allocate/deallocate sequences,
//! re-checking the allocator's state-machine invariants after every step.

use proptest::prelude::*;
use segward::{HeapArena, Segward, SegmentState, SegwardConfig};

const SEGMENT_SIZE: usize = 4096;
const SEGMENT_COUNT: usize = 8;

#[derive(Clone, Debug)]
enum Op {
    Alloc { size: usize, align_pow: u32 },
    Dealloc { which: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (8usize..=256, 0u32..=4).prop_map(|(size, align_pow)| Op::Alloc { size, align_pow }),
        (0usize..64).prop_map(|which| Op::Dealloc { which }),
    ]
}

fn assert_invariants(arena: &Segward<HeapArena>, outstanding: usize) {
    let mut sum = 0i64;
    for seg in 0..arena.segment_count() {
        let counter = arena.live_allocations(seg);
        assert!(counter >= 0, "segment {seg} has negative live count");
        match arena.segment_state(seg) {
            SegmentState::Empty | SegmentState::Retired => {
                assert_eq!(counter, 0, "segment {seg} ({:?}) has a nonzero counter", arena.segment_state(seg));
            }
            SegmentState::Full => {
                assert!(counter > 0, "segment {seg} is FULL with no live allocations");
            }
            SegmentState::Active => {}
        }
        sum += counter as i64;
    }
    assert_eq!(sum, outstanding as i64, "sum of live counters must match outstanding allocations");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn state_machine_invariants_hold_after_every_op(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut arena: Segward<HeapArena> =
            Segward::create_in(SEGMENT_SIZE, SEGMENT_SIZE * SEGMENT_COUNT, SegwardConfig::default()).unwrap();
        let mut live: Vec<*mut u8> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc { size, align_pow } => {
                    let align = 1usize << align_pow; // capped well under segment_size/256 = 16
                    if let Some(ptr) = arena.allocate(size, align) {
                        prop_assert_eq!((ptr as usize) % align, 0);
                        live.push(ptr);
                    }
                }
                Op::Dealloc { which } => {
                    if !live.is_empty() {
                        let idx = which % live.len();
                        let ptr = live.swap_remove(idx);
                        unsafe { arena.deallocate(ptr) };
                    }
                }
            }
            assert_invariants(&arena, live.len());
        }

        // draining everything retires (or leaves empty) every touched segment.
        for ptr in live {
            unsafe { arena.deallocate(ptr) };
        }
        assert_invariants(&arena, 0);
        for seg in 0..arena.segment_count() {
            prop_assert_ne!(arena.segment_state(seg), SegmentState::Full);
        }
    }
}
