#![cfg(test)]

// Property tests for MultiValueMap kept inside the crate so they can compare
// against the index layer's view as well as the public API.

use crate::multi_value_map::{DuplicatePolicy, MultiValueMap};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// Pool-indexed operations: indices shrink to earlier keys and values stay in a
// small range so duplicates show up often.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, u8),
    InsertMulti(usize, u8),
    Remove(usize),
    RemoveValue(usize, u8),
    ClearKey(usize),
    Clear,
    CloneAndMutate(usize, u8),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=6).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let val = 0u8..4;
        let op = prop_oneof![
            4 => (idx.clone(), val.clone()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), val.clone()).prop_map(|(i, v)| Op::InsertMulti(i, v)),
            1 => idx.clone().prop_map(Op::Remove),
            3 => (idx.clone(), val.clone()).prop_map(|(i, v)| Op::RemoveValue(i, v)),
            1 => idx.clone().prop_map(Op::ClearKey),
            1 => Just(Op::Clear),
            1 => (idx.clone(), val.clone()).prop_map(|(i, v)| Op::CloneAndMutate(i, v)),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn model_insert(
    model: &mut BTreeMap<String, Vec<u8>>,
    policy: DuplicatePolicy,
    k: &str,
    v: u8,
) -> bool {
    let vs = model.entry(k.to_string()).or_default();
    if policy == DuplicatePolicy::Reject && vs.contains(&v) {
        return false;
    }
    vs.push(v);
    true
}

fn model_remove_value(model: &mut BTreeMap<String, Vec<u8>>, k: &str, v: u8) -> usize {
    let Some(vs) = model.get_mut(k) else {
        return 0;
    };
    let before = vs.len();
    vs.retain(|x| *x != v);
    let removed = before - vs.len();
    if vs.is_empty() {
        model.remove(k);
    }
    removed
}

// Property: State-machine equivalence against a BTreeMap<String, Vec<u8>> model.
// Invariants exercised across random operation sequences:
// - Per-key values match the model in content and insertion order.
// - Under Reject no key holds a value twice; `insert` reports suppression.
// - A key is present iff it holds at least one value (pruning).
// - `keys().len() == count()` and the key set equals the model's.
// - `values()` is a permutation of all model values, grouped by key.
// - A clone mutated after copying never affects the original.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(reject in any::<bool>(), (pool, ops) in arb_scenario()) {
        let policy = if reject { DuplicatePolicy::Reject } else { DuplicatePolicy::Allow };
        let mut sut: MultiValueMap<String, u8> = MultiValueMap::with_policy(policy);
        let mut model: BTreeMap<String, Vec<u8>> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let appended = sut.insert(pool[i].clone(), v);
                    prop_assert_eq!(appended, model_insert(&mut model, policy, &pool[i], v));
                }
                Op::InsertMulti(i, v) => {
                    let appended = sut.insert_multi(pool[i].clone(), v);
                    prop_assert_eq!(appended, model_insert(&mut model, policy, &pool[i], v));
                }
                Op::Remove(i) => {
                    let expected = model.remove(&pool[i]).map_or(0, |vs| vs.len());
                    prop_assert_eq!(sut.remove(pool[i].as_str()), expected);
                }
                Op::RemoveValue(i, v) => {
                    let expected = model_remove_value(&mut model, &pool[i], v);
                    prop_assert_eq!(sut.remove_value(pool[i].as_str(), &v), expected);
                }
                Op::ClearKey(i) => {
                    model.remove(&pool[i]);
                    sut.clear_key(pool[i].as_str());
                }
                Op::Clear => {
                    model.clear();
                    sut.clear();
                }
                Op::CloneAndMutate(i, v) => {
                    let snapshot = sut.values_of(pool[i].as_str());
                    let mut copy = sut.clone();
                    copy.insert(pool[i].clone(), v.wrapping_add(1));
                    copy.remove_value(pool[i].as_str(), &v);
                    copy.remove(pool[(i + 1) % pool.len()].as_str());
                    prop_assert_eq!(sut.values_of(pool[i].as_str()), snapshot);
                }
            }

            // Invariants after each step
            let keys = sut.keys();
            prop_assert_eq!(keys.len(), sut.count());
            prop_assert_eq!(sut.count(), model.len());
            let key_set: BTreeSet<String> = keys.iter().cloned().collect();
            let model_keys: BTreeSet<String> = model.keys().cloned().collect();
            prop_assert_eq!(key_set, model_keys);

            for k in &pool {
                let expected = model.get(k).cloned().unwrap_or_default();
                prop_assert_eq!(sut.contains_key(k.as_str()), !expected.is_empty());
                prop_assert_eq!(sut.count_values(k.as_str()), expected.len());
                for v in 0u8..4 {
                    let n = expected.iter().filter(|x| **x == v).count();
                    prop_assert_eq!(sut.count_value(k.as_str(), &v), n);
                    prop_assert_eq!(sut.contains(k.as_str(), &v), n > 0);
                    if policy == DuplicatePolicy::Reject {
                        prop_assert!(n <= 1);
                    }
                }
                prop_assert_eq!(sut.values_of(k.as_str()), expected);
            }

            let grouped: Vec<u8> = keys.iter().flat_map(|k| sut.values_of(k.as_str())).collect();
            prop_assert_eq!(sut.values(), grouped);
            prop_assert_eq!(sut.total_values(), model.values().map(Vec::len).sum::<usize>());
            prop_assert_eq!(sut.index.len(), sut.count());
        }
    }
}
