//! Property-based tests comparing the AVL containers against the standard library's B-tree
//! collections.

use avl_collections::avl_tree::{AvlMap, AvlSet};
use avl_collections::capability::Reverse;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
enum Op {
    Insert(i16, i32),
    Remove(i16),
    Take(i16),
    PopFirst,
    PopLast,
}

fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            4 => (any::<i16>(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => any::<i16>().prop_map(Op::Remove),
            1 => any::<i16>().prop_map(Op::Take),
            1 => Just(Op::PopFirst),
            1 => Just(Op::PopLast),
        ],
        0..max_ops,
    )
}

// Keys drawn from a narrow range so that removals and duplicates actually hit.
fn narrow_keys(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..64, 0..max_len)
}

proptest! {
    #[test]
    fn map_matches_btreemap(ops in operations(400)) {
        let mut map = AvlMap::new();
        let mut expected = BTreeMap::new();

        for op in &ops {
            match *op {
                Op::Insert(k, v) => {
                    let is_new = expected.insert(k, v).is_none();
                    prop_assert_eq!(map.insert(k, v), Ok(is_new));
                },
                Op::Remove(k) => {
                    prop_assert_eq!(map.remove(&k), expected.remove(&k).is_some());
                },
                Op::Take(k) => {
                    prop_assert_eq!(map.take(&k), expected.remove(&k).map(|v| (k, v)));
                },
                Op::PopFirst => {
                    let first = expected.keys().next().cloned();
                    let popped = first.map(|k| (k, expected.remove(&k).unwrap()));
                    prop_assert_eq!(map.pop_first(), popped);
                },
                Op::PopLast => {
                    let last = expected.keys().next_back().cloned();
                    let popped = last.map(|k| (k, expected.remove(&k).unwrap()));
                    prop_assert_eq!(map.pop_last(), popped);
                },
            }
            map.assert_invariants();
        }

        prop_assert_eq!(map.len(), expected.len());
        prop_assert_eq!(
            map.iter().collect::<Vec<(&i16, &i32)>>(),
            expected.iter().collect::<Vec<(&i16, &i32)>>()
        );
        for (k, v) in &expected {
            prop_assert_eq!(map.get(k), Some(v));
        }
    }

    #[test]
    fn set_matches_btreeset(inserts in narrow_keys(200), removes in narrow_keys(200)) {
        let mut set = AvlSet::new();
        let mut expected = BTreeSet::new();

        for k in &inserts {
            prop_assert_eq!(set.insert(*k), Ok(expected.insert(*k)));
        }
        set.assert_invariants();

        for k in &removes {
            prop_assert_eq!(set.remove(k), expected.remove(k));
            prop_assert!(!set.contains(k));
        }
        set.assert_invariants();

        prop_assert_eq!(set.len(), expected.len());
        prop_assert!(set.iter().eq(expected.iter()));
        prop_assert!(set.iter().rev().eq(expected.iter().rev()));
    }

    #[test]
    fn floor_and_ceil_match_range_queries(keys in narrow_keys(100), probe in 0u8..70) {
        let mut set = AvlSet::new();
        let mut expected = BTreeSet::new();
        for k in &keys {
            set.insert(*k).unwrap();
            expected.insert(*k);
        }

        prop_assert_eq!(set.floor(&probe), expected.range(..=probe).next_back());
        prop_assert_eq!(set.ceil(&probe), expected.range(probe..).next());
    }

    #[test]
    fn reverse_order_iterates_backwards(keys in narrow_keys(100)) {
        let mut set = AvlSet::with_compare(Reverse(avl_collections::capability::NaturalOrder));
        let mut expected = BTreeSet::new();
        for k in &keys {
            set.insert(*k).unwrap();
            expected.insert(*k);
        }
        set.assert_invariants();
        prop_assert!(set.iter().eq(expected.iter().rev()));
    }

    #[test]
    fn insert_order_does_not_affect_comparison(keys in narrow_keys(100)) {
        let mut x = AvlSet::new();
        let mut y = AvlSet::new();
        for k in &keys {
            x.insert(*k).unwrap();
        }
        for k in keys.iter().rev() {
            y.insert(*k).unwrap();
        }
        prop_assert_eq!(x.compare(&y), std::cmp::Ordering::Equal);
        prop_assert!(x == y);
    }

    #[test]
    fn insert_then_remove_round_trips(keys in narrow_keys(100), extra in 64u8..128) {
        let mut set = AvlSet::new();
        for k in &keys {
            set.insert(*k).unwrap();
        }
        let before = set.iter().cloned().collect::<Vec<u8>>();

        prop_assert_eq!(set.insert(extra), Ok(true));
        prop_assert!(set.remove(&extra));
        set.assert_invariants();
        prop_assert_eq!(set.iter().cloned().collect::<Vec<u8>>(), before);
    }
}
