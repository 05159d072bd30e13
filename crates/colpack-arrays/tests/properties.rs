//! Property tests: the container behaves like a `Vec` of rows.
//!
//! Random operation sequences are applied to an `Arrays` and to a
//! `Vec<(u32, String)>` model; after every step both must agree column by
//! column, every column must stay aligned, and every element must be
//! dropped exactly once.

#![cfg(not(miri))]

use colpack_arrays::{Arrays, ArraysConfig, GrowthPolicy};
use colpack_test_utils::{CountingAllocator, DropTally, Tracked};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Append(u32),
    Insert(usize, u32),
    Remove(usize),
    Swap(usize, usize),
    Pop,
    Reserve(usize),
    Truncate(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u32>().prop_map(Op::Append),
        2 => (any::<usize>(), any::<u32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        2 => any::<usize>().prop_map(Op::Remove),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Swap(a, b)),
        1 => Just(Op::Pop),
        1 => (0usize..64).prop_map(Op::Reserve),
        1 => (0usize..16).prop_map(Op::Truncate),
    ]
}

fn arb_growth() -> impl Strategy<Value = GrowthPolicy> {
    prop_oneof![Just(GrowthPolicy::Exact), Just(GrowthPolicy::Doubling)]
}

fn check_model(arrays: &Arrays<(u32, String), &CountingAllocator>, model: &[(u32, String)]) {
    assert_eq!(arrays.len(), model.len());
    assert!(arrays.capacity() >= arrays.len());
    let ints: Vec<u32> = model.iter().map(|(n, _)| *n).collect();
    let names: Vec<&str> = model.iter().map(|(_, s)| s.as_str()).collect();
    assert_eq!(arrays.data::<0>(), ints.as_slice());
    assert_eq!(
        arrays.data::<1>().iter().map(String::as_str).collect::<Vec<_>>(),
        names
    );
}

proptest! {
    #[test]
    fn operations_match_vec_model(
        ops in prop::collection::vec(arb_op(), 0..64),
        growth in arb_growth(),
    ) {
        let alloc = CountingAllocator::new();
        let config = ArraysConfig::new().with_growth(growth);
        let mut model: Vec<(u32, String)> = Vec::new();
        {
            let mut arrays: Arrays<(u32, String), _> =
                Arrays::with_config_in(&config, &alloc).unwrap();
            for op in ops {
                match op {
                    Op::Append(v) => {
                        arrays.append((v, v.to_string()));
                        model.push((v, v.to_string()));
                    }
                    Op::Insert(i, v) => {
                        let i = i % (model.len() + 1);
                        arrays.insert_at(i, (v, v.to_string()));
                        model.insert(i, (v, v.to_string()));
                    }
                    Op::Remove(i) if !model.is_empty() => {
                        let i = i % model.len();
                        let row = arrays.take_at(i);
                        prop_assert_eq!(row, model.remove(i));
                    }
                    Op::Swap(a, b) if !model.is_empty() => {
                        let (a, b) = (a % model.len(), b % model.len());
                        arrays.swap_at(a, b);
                        model.swap(a, b);
                    }
                    Op::Pop => {
                        prop_assert_eq!(arrays.pop(), model.pop());
                    }
                    Op::Reserve(n) => {
                        let before = arrays.capacity();
                        arrays.reserve(n);
                        prop_assert_eq!(arrays.capacity(), before.max(n));
                    }
                    Op::Truncate(n) => {
                        arrays.truncate(n);
                        model.truncate(n);
                    }
                    Op::Remove(_) | Op::Swap(..) => {}
                }
                check_model(&arrays, &model);
                prop_assert!(alloc.live_regions() <= 1);
            }
        }
        prop_assert_eq!(alloc.live_regions(), 0);
        prop_assert_eq!(alloc.allocations(), alloc.deallocations());
    }

    #[test]
    fn insert_then_remove_restores_rows(
        values in prop::collection::vec(any::<u32>(), 0..32),
        index in any::<usize>(),
        extra in any::<u32>(),
    ) {
        let mut arrays: Arrays<(u32, String)> =
            values.iter().map(|&v| (v, v.to_string())).collect();
        let i = index % (values.len() + 1);
        arrays.insert_at(i, (extra, extra.to_string()));
        prop_assert_eq!(*arrays.at::<0>(i), extra);
        arrays.remove_at(i);
        prop_assert_eq!(arrays.data::<0>(), values.as_slice());
    }

    #[test]
    fn swapping_twice_is_identity(
        values in prop::collection::vec(any::<u32>(), 1..32),
        a in any::<usize>(),
        b in any::<usize>(),
    ) {
        let mut arrays: Arrays<(u32, String)> =
            values.iter().map(|&v| (v, v.to_string())).collect();
        let (a, b) = (a % values.len(), b % values.len());
        arrays.swap_at(a, b);
        arrays.swap_at(a, b);
        prop_assert_eq!(arrays.data::<0>(), values.as_slice());
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(arrays.at::<1>(i), &v.to_string());
        }
    }

    #[test]
    fn columns_respect_requested_alignment(
        shifts in prop::array::uniform3(0u32..8),
        rows in 0usize..40,
    ) {
        let config = ArraysConfig::new()
            .with_alignment(0, 1 << shifts[0])
            .with_alignment(1, 1 << shifts[1])
            .with_alignment(2, 1 << shifts[2]);
        let mut arrays: Arrays<(u8, u64, [u16; 3])> = Arrays::with_config(&config).unwrap();
        for i in 0..rows {
            arrays.append((i as u8, i as u64, [i as u16; 3]));
            let a0 = (1usize << shifts[0]).max(1);
            let a1 = (1usize << shifts[1]).max(std::mem::align_of::<u64>());
            let a2 = (1usize << shifts[2]).max(std::mem::align_of::<u16>());
            prop_assert_eq!(arrays.as_ptr::<0>() as usize % a0, 0);
            prop_assert_eq!(arrays.as_ptr::<1>() as usize % a1, 0);
            prop_assert_eq!(arrays.as_ptr::<2>() as usize % a2, 0);
        }
        prop_assert_eq!(arrays.len(), rows);
        for i in 0..rows {
            prop_assert_eq!(*arrays.at::<1>(i), i as u64);
        }
    }

    #[test]
    fn tracked_values_dropped_exactly_once(
        ops in prop::collection::vec(arb_op(), 0..48),
    ) {
        let tally = DropTally::new();
        let mut created = 0u64;
        {
            let mut arrays: Arrays<(Tracked, u32)> = Arrays::new();
            for op in ops {
                match op {
                    Op::Append(v) => {
                        arrays.append((tally.track(created), v));
                        created += 1;
                    }
                    Op::Insert(i, v) => {
                        let i = i % (arrays.len() + 1);
                        arrays.insert_at(i, (tally.track(created), v));
                        created += 1;
                    }
                    Op::Remove(i) if !arrays.is_empty() => {
                        let i = i % arrays.len();
                        arrays.remove_at(i);
                    }
                    Op::Swap(a, b) if !arrays.is_empty() => {
                        let len = arrays.len();
                        arrays.swap_at(a % len, b % len);
                    }
                    Op::Pop => drop(arrays.pop()),
                    Op::Reserve(n) => arrays.reserve(n),
                    Op::Truncate(n) => arrays.truncate(n),
                    Op::Remove(_) | Op::Swap(..) => {}
                }
                prop_assert_eq!(tally.total() as u64 + arrays.len() as u64, created);
            }
        }
        prop_assert_eq!(tally.total() as u64, created);
        prop_assert!(tally.double_drops().is_empty());
    }
}
