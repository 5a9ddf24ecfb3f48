use multi_toolbox::{DuplicatePolicy, MultiValueMap};
use proptest::prelude::*;

// Drive the public API with random insert/remove traffic and check the
// counting invariants after every step: keys().len() == count(), and a key is
// listed iff it reports at least one value.
proptest! {
    #[test]
    fn prop_counts_stay_consistent(
        reject in any::<bool>(),
        keys in 1usize..=5,
        ops in proptest::collection::vec((0u8..=3u8, 0usize..100usize, 0u8..3u8), 1..120),
    ) {
        let policy = if reject { DuplicatePolicy::Reject } else { DuplicatePolicy::Allow };
        let mut m: MultiValueMap<String, u8> = MultiValueMap::with_policy(policy);
        let mut expected_values = vec![0usize; keys];

        for (op, raw_k, v) in ops {
            let k = raw_k % keys;
            let key = format!("k{}", k);
            match op {
                // Insert; the map reports whether the value was appended.
                0 | 1 => {
                    if m.insert(key.clone(), v) {
                        expected_values[k] += 1;
                    } else {
                        prop_assert!(reject);
                    }
                }
                // Remove every occurrence of one value.
                2 => {
                    expected_values[k] -= m.remove_value(key.as_str(), &v);
                }
                // Remove the whole key.
                3 => {
                    prop_assert_eq!(m.remove(key.as_str()), expected_values[k]);
                    expected_values[k] = 0;
                }
                _ => unreachable!(),
            }

            // Invariants after each step
            prop_assert_eq!(m.keys().len(), m.count());
            prop_assert_eq!(m.count_values(key.as_str()), expected_values[k]);
            prop_assert_eq!(m.contains_key(key.as_str()), expected_values[k] > 0);
        }

        // Final invariant: count equals the number of keys still holding values
        let live = expected_values.iter().filter(|n| **n > 0).count();
        prop_assert_eq!(m.count(), live);
        prop_assert_eq!(m.values().len(), expected_values.iter().sum::<usize>());
    }
}
