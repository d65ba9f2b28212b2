//! Property-based tests for the skip-list set-operation invariants.

use proptest::collection::btree_set;
use proptest::prelude::*;
use skipdex::SkipList;

fn sorted_ids() -> impl Strategy<Value = Vec<u64>> {
    btree_set(0u64..500, 0..60).prop_map(|set| set.into_iter().collect())
}

fn value_set(list: &SkipList) -> std::collections::BTreeSet<u64> {
    list.get_value_string()
        .split_whitespace()
        .map(|s| s.parse().unwrap())
        .collect()
}

fn is_strictly_ascending(values: &str) -> bool {
    let parsed: Vec<u64> = values
        .split_whitespace()
        .map(|s| s.parse().unwrap())
        .collect();
    parsed.windows(2).all(|w| w[0] < w[1])
}

proptest! {
    #[test]
    fn sort_invariant_holds_for_any_construction(ids in sorted_ids()) {
        let list = SkipList::from_ids(&ids);
        prop_assert!(is_strictly_ascending(&list.serialize()));
    }

    #[test]
    fn or_and_merge_never_duplicate_ids(a in sorted_ids(), b in sorted_ids()) {
        let la = SkipList::from_ids(&a);
        let lb = SkipList::from_ids(&b);
        prop_assert!(is_strictly_ascending(&la.or(&lb).serialize()));
        prop_assert!(is_strictly_ascending(&la.merge(&lb).serialize()));
    }

    #[test]
    fn and_is_idempotent_and_commutative(a in sorted_ids(), b in sorted_ids()) {
        let la = SkipList::from_ids(&a);
        let lb = SkipList::from_ids(&b);
        prop_assert_eq!(la.and(&la), la.clone());
        prop_assert_eq!(la.and(&lb), lb.and(&la));
    }

    #[test]
    fn or_is_idempotent_and_commutative(a in sorted_ids(), b in sorted_ids()) {
        let la = SkipList::from_ids(&a);
        let lb = SkipList::from_ids(&b);
        prop_assert_eq!(la.or(&la), la.clone());
        prop_assert_eq!(la.or(&lb), lb.or(&la));
    }

    #[test]
    fn double_not_is_identity_for_a_subset(universe_ids in sorted_ids()) {
        // take every other id as the subset being negated twice
        let subset: Vec<u64> = universe_ids.iter().step_by(2).copied().collect();
        let universe = SkipList::from_ids(&universe_ids);
        let a = SkipList::from_ids(&subset);
        let not_a = universe.not(&a);
        let not_not_a = universe.not(&not_a);
        prop_assert_eq!(not_not_a, a);
    }

    #[test]
    fn and_matches_with_and_without_skip_pointers(a in sorted_ids(), b in sorted_ids()) {
        let with_skips = SkipList::from_ids(&a);
        let without_skips = SkipList::from_string(&with_skips.get_value_string()).unwrap();
        let other = SkipList::from_ids(&b);
        prop_assert_eq!(with_skips.and(&other), without_skips.and(&other));
    }

    #[test]
    fn round_trip_preserves_value_set(ids in sorted_ids()) {
        let list = SkipList::from_ids(&ids);
        let reparsed = SkipList::from_string(&list.serialize()).unwrap();
        prop_assert_eq!(value_set(&list), value_set(&reparsed));
    }

    #[test]
    fn skip_placement_matches_the_documented_stride(ids in btree_set(0u64..2000, 4..200)) {
        let values: Vec<u64> = ids.into_iter().collect();
        let list = SkipList::from_ids(&values);
        let len = values.len();
        let d = (len as f64).sqrt().round() as usize;
        if d > 0 {
            let mut expected_sources = Vec::new();
            let mut i = 0usize;
            loop {
                let from_idx = i * d;
                let to_idx = (i + 1) * d;
                if from_idx >= len || to_idx >= len {
                    break;
                }
                expected_sources.push(from_idx);
                i += 1;
            }
            // every serialized token at an expected source index carries a '^' skip marker
            let tokens: Vec<&str> = list.serialize().split_whitespace().collect();
            for idx in expected_sources {
                prop_assert!(tokens[idx].contains('^'));
            }
        }
    }
}

#[test]
fn tiny_lists_never_have_skip_annotations() {
    for len in 0..=3 {
        let ids: Vec<u64> = (1..=len as u64).collect();
        let list = SkipList::from_ids(&ids);
        assert!(!list.serialize().contains('^'));
    }
}

#[test]
fn not_of_empty_operand_is_self() {
    let universe = SkipList::from_ids(&[1, 2, 3, 4, 5]);
    let empty = SkipList::new();
    assert_eq!(universe.not(&empty), universe);
}
