//! Property-based tests for the heap.
//!
//! Uses proptest to drive random operation sequences and verify the heap
//! invariants hold after every step.

use memsim::memory::{HeapState, PidPolicy, PlacementPolicy};
use proptest::prelude::*;

const CAPACITY: u64 = 256;

#[derive(Debug, Clone)]
enum Op {
    Allocate(u64),
    Deallocate(u32),
    Compact,
}

/// Strategy for generating heap operations; pids stay small so frees often hit
fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u64..=64).prop_map(Op::Allocate),
        2 => (1u32..=12).prop_map(Op::Deallocate),
        1 => Just(Op::Compact),
    ]
}

fn apply(heap: &mut HeapState, op: &Op, policy: PidPolicy) {
    // Failures are expected (full heap, unknown pid) and must not corrupt anything
    match op {
        Op::Allocate(size) => {
            let _ = heap.allocate(*size, policy);
        }
        Op::Deallocate(pid) => {
            let _ = heap.deallocate(*pid);
        }
        Op::Compact => {
            heap.compact();
        }
    }
}

fn policy() -> impl Strategy<Value = PidPolicy> {
    prop_oneof![Just(PidPolicy::ReuseLowest), Just(PidPolicy::Monotonic)]
}

proptest! {
    /// Allocated plus free space always equals capacity
    #[test]
    fn conservation(ops in prop::collection::vec(op(), 0..60), policy in policy()) {
        let mut heap = HeapState::new(CAPACITY);
        for op in &ops {
            apply(&mut heap, op, policy);
            let allocated: u64 = heap.blocks().iter().map(|b| b.size()).sum();
            let free: u64 = heap.find_free_ranges().iter().map(|r| r.size()).sum();
            prop_assert_eq!(allocated + free, CAPACITY);
        }
    }

    /// Blocks never overlap, stay in range and the heap always validates
    #[test]
    fn no_overlap(ops in prop::collection::vec(op(), 0..60), policy in policy()) {
        let mut heap = HeapState::new(CAPACITY);
        for op in &ops {
            apply(&mut heap, op, policy);
            prop_assert!(heap.validate().is_ok());
            let blocks = heap.blocks();
            for (i, a) in blocks.iter().enumerate() {
                prop_assert!(a.end() <= CAPACITY);
                for b in &blocks[i + 1..] {
                    prop_assert!(!a.overlaps(b));
                }
            }
        }
    }

    /// A new block lands at the lowest-start free range that fits
    #[test]
    fn first_fit(ops in prop::collection::vec(op(), 0..40), size in 1u64..=64) {
        let mut heap = HeapState::new(CAPACITY);
        for op in &ops {
            apply(&mut heap, op, PidPolicy::ReuseLowest);
        }

        let expected = heap.find_free_ranges().into_iter().find(|r| r.size() >= size);
        match (heap.allocate(size, PidPolicy::ReuseLowest), expected) {
            (Ok(block), Some(range)) => prop_assert_eq!(block.start(), range.start),
            (Err(_), None) => {}
            (got, want) => prop_assert!(false, "allocation {:?} vs free range {:?}", got, want),
        }
    }

    /// Best-fit takes the smallest sufficient range, lowest start on ties
    #[test]
    fn best_fit(ops in prop::collection::vec(op(), 0..40), size in 1u64..=64) {
        let mut heap = HeapState::new(CAPACITY);
        for op in &ops {
            apply(&mut heap, op, PidPolicy::ReuseLowest);
        }

        let smallest = heap
            .find_free_ranges()
            .into_iter()
            .filter(|r| r.size() >= size)
            .map(|r| r.size())
            .min();
        // First range of the smallest sufficient size, in address order
        let expected = heap
            .find_free_ranges()
            .into_iter()
            .find(|r| Some(r.size()) == smallest);
        match (heap.allocate_with(size, PlacementPolicy::BestFit, PidPolicy::ReuseLowest), expected) {
            (Ok(block), Some(range)) => prop_assert_eq!(block.start(), range.start),
            (Err(_), None) => {}
            (got, want) => prop_assert!(false, "allocation {:?} vs free range {:?}", got, want),
        }
    }

    /// Compaction keeps order, leaves one trailing free range, and is idempotent
    #[test]
    fn compaction(ops in prop::collection::vec(op(), 0..60)) {
        let mut heap = HeapState::new(CAPACITY);
        for op in &ops {
            apply(&mut heap, op, PidPolicy::ReuseLowest);
        }

        let order: Vec<u32> = heap.blocks().iter().map(|b| b.pid()).collect();
        let used = heap.used();
        heap.compact();

        let after: Vec<u32> = heap.blocks().iter().map(|b| b.pid()).collect();
        prop_assert_eq!(&after, &order);
        let mut cursor = 0;
        for block in heap.blocks() {
            prop_assert_eq!(block.start(), cursor);
            cursor = block.end();
        }
        prop_assert_eq!(cursor, used);

        let snapshot = heap.clone();
        prop_assert_eq!(heap.compact(), 0);
        prop_assert_eq!(heap, snapshot);
    }

    /// Under the reuse policy a new pid is the smallest one not in use
    #[test]
    fn pid_reuse(ops in prop::collection::vec(op(), 0..60)) {
        let mut heap = HeapState::new(CAPACITY);
        for op in &ops {
            apply(&mut heap, op, PidPolicy::ReuseLowest);
        }

        let smallest_unused = (1u32..).find(|pid| !heap.contains_pid(*pid)).unwrap();
        if let Ok(block) = heap.allocate(1, PidPolicy::ReuseLowest) {
            prop_assert_eq!(block.pid(), smallest_unused);
        }
    }
}
