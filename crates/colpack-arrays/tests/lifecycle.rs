//! Integration test: element lifetimes and region bookkeeping.
//!
//! Every element placed in a container must be dropped exactly once, no
//! matter which combination of operations moved it around, and every region
//! the container obtains must be released exactly once.

use std::panic::{self, AssertUnwindSafe};

use colpack_arrays::{Arrays, ArraysConfig, GrowthPolicy};
use colpack_test_utils::{CountingAllocator, DropTally, Tracked};

// ── Drop accounting ─────────────────────────────────────────────

#[test]
fn every_element_dropped_once_through_mixed_operations() {
    let tally = DropTally::new();
    {
        let mut arrays: Arrays<(Tracked, u32, Tracked)> = Arrays::new();
        for id in 0..10u64 {
            arrays.append((tally.track(id), id as u32, tally.track(100 + id)));
        }
        arrays.insert_at(3, (tally.track(50), 50, tally.track(150)));
        arrays.remove_at(0);
        arrays.swap_at(1, 7);
        arrays.swap_at(4, 4);
        let taken = arrays.take_at(2);
        drop(taken);
        let popped = arrays.pop();
        drop(popped);
        arrays.truncate(5);
        assert_eq!(arrays.len(), 5);
        assert!(tally.double_drops().is_empty());
    }
    assert_eq!(tally.total(), 22);
    assert!(tally.double_drops().is_empty());
}

#[test]
fn growth_relocates_without_dropping() {
    let tally = DropTally::new();
    let mut arrays: Arrays<(Tracked, String)> = Arrays::new();
    for id in 0..32u64 {
        arrays.append((tally.track(id), format!("row {id}")));
    }
    assert_eq!(tally.total(), 0);
    let ids: Vec<u64> = arrays.data::<0>().iter().map(|t| t.id).collect();
    assert_eq!(ids, (0..32).collect::<Vec<_>>());
    assert_eq!(arrays.at::<1>(31), "row 31");
    drop(arrays);
    assert_eq!(tally.total(), 32);
}

#[test]
fn remove_drops_only_the_removed_row() {
    let tally = DropTally::new();
    let mut arrays: Arrays<(Tracked,)> = (0..4).map(|id| (tally.track(id),)).collect();
    arrays.remove_at(1);
    assert_eq!(tally.drops_of(1), 1);
    assert_eq!(tally.total(), 1);
    let ids: Vec<u64> = arrays.data::<0>().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![0, 2, 3]);
}

#[test]
fn clear_drops_everything_and_keeps_capacity() {
    let tally = DropTally::new();
    let mut arrays: Arrays<(Tracked, Tracked)> = Arrays::with_capacity(8);
    for id in 0..8 {
        arrays.append((tally.track(id), tally.track(id + 8)));
    }
    arrays.clear();
    assert_eq!(tally.total(), 16);
    assert_eq!(arrays.capacity(), 8);
    assert!(arrays.is_empty());
}

// ── Region accounting ───────────────────────────────────────────

#[test]
fn each_growth_replaces_exactly_one_region() {
    let alloc = CountingAllocator::new();
    {
        let mut arrays: Arrays<(u64, String), _> = Arrays::new_in(&alloc);
        assert_eq!(alloc.allocations(), 0);
        for i in 0..6u64 {
            arrays.append((i, i.to_string()));
            assert_eq!(alloc.live_regions(), 1);
        }
        assert_eq!(alloc.allocations(), 6);
        assert_eq!(alloc.deallocations(), 5);
    }
    assert_eq!(alloc.live_regions(), 0);
    assert_eq!(alloc.deallocations(), 6);
}

#[test]
fn reserve_sizes_region_with_alignment_budget() {
    let alloc = CountingAllocator::new();
    let config = ArraysConfig::new().with_alignment(0, 8).with_alignment(1, 16);
    let mut arrays: Arrays<(i32, bool), _> = Arrays::with_config_in(&config, &alloc).unwrap();
    arrays.reserve(10);
    assert_eq!(alloc.live_sizes(), vec![4 * 10 + 10 + 8 + 16]);
    arrays.reserve(3);
    assert_eq!(alloc.allocations(), 1);
}

#[test]
fn doubling_growth_allocates_logarithmically() {
    let alloc = CountingAllocator::new();
    let config = ArraysConfig::new().with_growth(GrowthPolicy::Doubling);
    let mut arrays: Arrays<(u32,), _> = Arrays::with_config_in(&config, &alloc).unwrap();
    for i in 0..100 {
        arrays.append((i,));
    }
    // 4, 8, 16, 32, 64, 128
    assert_eq!(alloc.allocations(), 6);
    assert_eq!(arrays.capacity(), 128);
}

#[test]
fn empty_container_never_allocates() {
    let alloc = CountingAllocator::new();
    {
        let mut arrays: Arrays<(String, u8), _> = Arrays::new_in(&alloc);
        arrays.clear();
        arrays.truncate(0);
        assert_eq!(arrays.pop(), None);
    }
    assert_eq!(alloc.allocations(), 0);
    assert_eq!(alloc.deallocations(), 0);
}

// ── Panicking destructors ───────────────────────────────────────

/// Panics when dropped if armed.
struct Fuse {
    armed: bool,
}

impl Drop for Fuse {
    fn drop(&mut self) {
        if self.armed {
            panic!("fuse blew");
        }
    }
}

#[test]
fn panicking_drop_still_releases_buffer_and_other_columns() {
    let alloc = CountingAllocator::new();
    let tally = DropTally::new();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut arrays: Arrays<(Fuse, Tracked), _> = Arrays::new_in(&alloc);
        arrays.append((Fuse { armed: true }, tally.track(0)));
        arrays.append((Fuse { armed: false }, tally.track(1)));
        drop(arrays);
    }));
    assert!(result.is_err());
    assert_eq!(tally.total(), 2);
    assert!(tally.double_drops().is_empty());
    assert_eq!(alloc.live_regions(), 0);
    assert_eq!(alloc.allocations(), alloc.deallocations());
}

#[test]
fn panicking_truncate_leaves_container_usable() {
    let alloc = CountingAllocator::new();
    let tally = DropTally::new();
    {
        let mut arrays: Arrays<(Fuse, Tracked), _> = Arrays::new_in(&alloc);
        arrays.append((Fuse { armed: false }, tally.track(0)));
        arrays.append((Fuse { armed: true }, tally.track(1)));
        let result = panic::catch_unwind(AssertUnwindSafe(|| arrays.truncate(1)));
        assert!(result.is_err());
        assert_eq!(arrays.len(), 1);
        assert_eq!(tally.drops_of(1), 1);
        arrays.append((Fuse { armed: false }, tally.track(2)));
        assert_eq!(arrays.len(), 2);
    }
    assert_eq!(tally.total(), 3);
    assert!(tally.double_drops().is_empty());
    assert_eq!(alloc.live_regions(), 0);
}
