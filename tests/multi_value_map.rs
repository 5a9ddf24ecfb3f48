// MultiValueMap integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Policy: Reject stores a (key, value) pair once, Allow appends every time.
// - Pruning: a key is present iff it holds at least one value.
// - Counting: keys().len() == count() after every mutation.
// - Copying: clones are deep and independent in both directions.
// - Ordering: values under a key keep insertion order; cross-key order is
//   not assumed.
use multi_toolbox::{DuplicatePolicy, MultiValueMap};
use std::collections::BTreeSet;

fn key_set<K: Ord + Clone, V: Clone>(m: &MultiValueMap<K, V>) -> BTreeSet<K> {
    m.keys().into_iter().collect()
}

// Test: duplicate suppression.
// Assumes: the map was built with DuplicatePolicy::Reject.
// Verifies: a repeated pair is stored once and insert reports the no-op.
#[test]
fn duplicate_insert_suppressed_when_rejected() {
    let mut m = MultiValueMap::with_policy(DuplicatePolicy::Reject);
    assert!(!m.duplicates_allowed());
    assert!(m.insert("k".to_string(), 10));
    assert!(!m.insert("k".to_string(), 10));
    assert!(!m.insert_multi("k".to_string(), 10));

    assert_eq!(m.count_value("k", &10), 1);
    assert_eq!(m.count_values("k"), 1);
    assert_eq!(m.count(), 1);
}

// Test: duplicate allowance.
// Assumes: default construction allows duplicates.
// Verifies: a repeated pair is stored twice.
#[test]
fn duplicate_insert_kept_when_allowed() {
    let mut m = MultiValueMap::new();
    assert_eq!(m.policy(), DuplicatePolicy::Allow);
    m.insert("k".to_string(), 10);
    m.insert("k".to_string(), 10);

    assert_eq!(m.count_value("k", &10), 2);
    assert_eq!(m.count_values("k"), 2);
    assert_eq!(m.values_of("k"), vec![10, 10]);
}

// Test: pruning by single-value removal.
// Assumes: a key holding several values.
// Verifies: removing them one by one drops the key once the last one goes.
#[test]
fn key_pruned_after_values_removed_one_by_one() {
    let mut m = MultiValueMap::new();
    for v in [1, 2, 3] {
        m.insert("k", v);
    }
    m.insert("other", 0);

    assert_eq!(m.remove_value("k", &1), 1);
    assert_eq!(m.remove_value("k", &2), 1);
    assert!(m.contains_key("k"));
    assert_eq!(m.remove_value("k", &3), 1);

    assert!(!m.contains_key("k"));
    assert!(!m.keys().contains(&"k"));
    assert_eq!(m.count_values("k"), 0);
    assert_eq!(m.keys(), vec!["other"]);
}

// Test: pruning by bulk removal.
// Verifies: remove(key) drops the key and returns its value count; a second
// call returns 0.
#[test]
fn key_pruned_after_bulk_remove() {
    let mut m = MultiValueMap::new();
    m.extend([("k", 'a'), ("k", 'b'), ("j", 'c')]);
    assert_eq!(m.remove("k"), 2);
    assert_eq!(m.remove("k"), 0);
    assert!(!m.contains_key("k"));
    assert_eq!(key_set(&m), BTreeSet::from(["j"]));
}

// Test: all occurrences go at once.
// Verifies: remove_value removes every occurrence and keeps the survivors'
// order.
#[test]
fn remove_value_drops_every_occurrence() {
    let mut m = MultiValueMap::new();
    for v in [5, 1, 5, 2, 5] {
        m.insert(0u32, v);
    }
    assert_eq!(m.remove_value(&0, &5), 3);
    assert_eq!(m.values_of(&0), vec![1, 2]);
    assert!(!m.contains(&0, &5));
}

// Test: deep copy independence.
// Assumes: A holds k -> [v1, v2].
// Verifies: inserting into / removing from the copy leaves A unchanged, and
// vice versa.
#[test]
fn copy_is_independent_of_original() {
    let mut a = MultiValueMap::new();
    a.insert("k".to_string(), "v1".to_string());
    a.insert("k".to_string(), "v2".to_string());

    let mut b = a.clone();
    b.insert("k".to_string(), "v3".to_string());
    b.remove_value("k", &"v1".to_string());
    assert_eq!(a.values_of("k"), vec!["v1".to_string(), "v2".to_string()]);

    b.remove("k");
    assert_eq!(a.count_values("k"), 2);

    a.insert("k".to_string(), "v4".to_string());
    assert!(!b.contains_key("k"));
}

// Test: assignment semantics.
// Verifies: clone_from discards the target's entries and copies the source's
// entries and policy; later edits do not leak back.
#[test]
fn clone_from_replaces_target() {
    let mut src = MultiValueMap::with_policy(DuplicatePolicy::Reject);
    src.insert(1, "one");
    let mut dst = MultiValueMap::new();
    dst.insert(2, "two");

    dst.clone_from(&src);
    assert_eq!(key_set(&dst), BTreeSet::from([1]));
    assert!(!dst.insert(1, "one"), "copied policy rejects the duplicate");
    dst.insert(1, "uno");
    assert_eq!(src.values_of(&1), vec!["one"]);
}

// Test: count consistency across a scripted mix of operations.
// Verifies: keys().len() == count() after each step.
#[test]
fn key_listing_matches_count_throughout() {
    let mut m = MultiValueMap::with_policy(DuplicatePolicy::Reject);
    let check = |m: &MultiValueMap<u32, u32>| assert_eq!(m.keys().len(), m.count());

    for i in 0..50u32 {
        m.insert(i % 7, i % 3);
        check(&m);
    }
    for i in 0..7u32 {
        m.remove_value(&i, &0);
        check(&m);
    }
    m.clear_key(&3);
    check(&m);
    m.remove(&4);
    check(&m);
    m.clear();
    check(&m);
    assert!(m.is_empty());
}

// Test: flattened values.
// Assumes: nothing about cross-key order.
// Verifies: values() holds every value exactly as often as inserted, and each
// key's run stays contiguous and in order.
#[test]
fn flattened_values_cover_every_insert() {
    let mut m = MultiValueMap::new();
    m.extend([("a", 1), ("b", 2), ("a", 3), ("c", 4), ("b", 5)]);

    let mut all = m.values();
    let runs: Vec<i32> = m.keys().iter().flat_map(|k| m.values_of(k)).collect();
    assert_eq!(all, runs);
    all.sort();
    assert_eq!(all, vec![1, 2, 3, 4, 5]);
    assert_eq!(m.total_values(), 5);
}

// Test: read-only access.
// Verifies: values_of hands out a copy; get hands out a borrowed slice; absent
// keys read as empty.
#[test]
fn reads_do_not_expose_internal_state() {
    let mut m = MultiValueMap::new();
    m.insert("k", vec![1u8]);

    let mut copy = m.values_of("k");
    copy[0].push(2);
    copy.push(vec![9]);
    assert_eq!(m.values_of("k"), vec![vec![1u8]]);
    assert_eq!(m.get("k").map(<[Vec<u8>]>::len), Some(1));
    assert!(m.values_of("x").is_empty());
    assert_eq!(m.count_value("x", &vec![1]), 0);
}
