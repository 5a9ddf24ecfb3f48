//! MultiValueMap: one key to an ordered list of values, with a per-instance
//! duplicate policy, built atop `KeyIndex`.

use crate::key_index::KeyIndex;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Whether a key may hold the same value more than once.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum DuplicatePolicy {
    /// Every insert appends.
    #[default]
    Allow,
    /// Inserting a value already present under the key is absorbed as a no-op.
    Reject,
}

/// Associative container mapping each key to an ordered, non-empty `Vec<V>`.
///
/// Values under a key keep insertion order. Order across keys is the index's
/// slot order and should not be relied upon. A key exists exactly as long as
/// it holds at least one value: removing the last value prunes the key.
///
/// The map is not internally synchronized; mutation takes `&mut self`.
/// `Clone` is a deep copy that shares no storage with the source.
pub struct MultiValueMap<K, V, S = RandomState> {
    pub(crate) index: KeyIndex<K, Vec<V>, S>,
    policy: DuplicatePolicy,
}

impl<K, V> MultiValueMap<K, V> {
    /// Empty map that allows duplicate values.
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Allow)
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            index: KeyIndex::new(),
            policy,
        }
    }
}

impl<K, V, S> MultiValueMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_policy_and_hasher(DuplicatePolicy::Allow, hasher)
    }

    pub fn with_policy_and_hasher(policy: DuplicatePolicy, hasher: S) -> Self {
        Self {
            index: KeyIndex::with_hasher(hasher),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn duplicates_allowed(&self) -> bool {
        self.policy == DuplicatePolicy::Allow
    }

    /// Number of distinct keys.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of values across all keys.
    pub fn total_values(&self) -> usize {
        self.index.iter().map(|(_, vs)| vs.len()).sum()
    }

    /// Drops every key together with its values.
    pub fn clear(&mut self) {
        self.index.clear();
        self.debug_check_counts();
    }

    #[inline]
    fn debug_check_counts(&self) {
        self.index.debug_check();
    }
}

impl<K, V, S> MultiValueMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// Appends `value` under `key`, creating the key on first use.
    ///
    /// Under [`DuplicatePolicy::Reject`] a value already present under `key` is
    /// not appended again; debug builds log a warning. Returns whether the
    /// value was appended.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let reject = self.policy == DuplicatePolicy::Reject;
        let values = self.index.get_or_insert_with(key, Vec::new);
        if reject && values.contains(&value) {
            #[cfg(debug_assertions)]
            tracing::warn!(
                target: "multi_toolbox::multi_value_map",
                values_under_key = values.len(),
                "MultiValueMap::insert: trying to add duplicate value when duplicates are disallowed"
            );
            return false;
        }
        values.push(value);
        debug_assert!(!reject || !has_duplicates(values));
        self.debug_check_counts();
        true
    }

    /// Same as [`insert`](Self::insert); kept for call sites that want to
    /// spell out that the key may already hold values.
    pub fn insert_multi(&mut self, key: K, value: V) -> bool {
        self.insert(key, value)
    }

    /// Borrowed view of the values under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&[V]>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.get(key).map(Vec::as_slice)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains_key(key)
    }

    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index
            .get(key)
            .map(|vs| vs.contains(value))
            .unwrap_or(false)
    }

    /// Number of values under `key`, 0 when absent.
    pub fn count_values<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.get(key).map_or(0, Vec::len)
    }

    /// Occurrences of `value` under `key`. At most 1 under `Reject`.
    pub fn count_value<Q>(&self, key: &Q, value: &V) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index
            .get(key)
            .map_or(0, |vs| vs.iter().filter(|v| *v == value).count())
    }

    /// Removes `key` and all its values; returns how many values went with it.
    pub fn remove<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = self.index.remove(key).map_or(0, |(_, vs)| vs.len());
        debug_assert!(!self.contains_key(key));
        self.debug_check_counts();
        removed
    }

    /// Removes every occurrence of `value` under `key` and prunes the key if
    /// nothing is left. Returns the number of occurrences removed.
    pub fn remove_value<Q>(&mut self, key: &Q, value: &V) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(values) = self.index.get_mut(key) else {
            return 0;
        };
        let before = values.len();
        values.retain(|v| v != value);
        let removed = before - values.len();
        if values.is_empty() {
            let pruned = self.index.remove(key);
            debug_assert!(pruned.is_some_and(|(_, vs)| vs.is_empty()));
            debug_assert!(!self.contains_key(key));
        }
        debug_assert!(!self.contains(key, value));
        self.debug_check_counts();
        removed
    }

    /// Same as [`remove`](Self::remove) without the count.
    pub fn clear_key<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _ = self.remove(key);
    }
}

impl<K: Clone, V, S> MultiValueMap<K, V, S> {
    /// Copy of the distinct keys currently present.
    pub fn keys(&self) -> Vec<K> {
        self.index.iter().map(|(k, _)| k.clone()).collect()
    }
}

impl<K, V: Clone, S> MultiValueMap<K, V, S> {
    /// Copy of every value, grouped by key in key order, each group in
    /// insertion order.
    pub fn values(&self) -> Vec<V> {
        let mut out = Vec::with_capacity(self.total_values());
        for (_, vs) in self.index.iter() {
            out.extend_from_slice(vs);
        }
        out
    }
}

impl<K, V, S> MultiValueMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq + Clone,
    S: BuildHasher,
{
    /// Copy of the values under `key`, empty when the key is absent.
    pub fn values_of<Q>(&self, key: &Q) -> Vec<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).map(<[V]>::to_vec).unwrap_or_default()
    }
}

fn has_duplicates<V: PartialEq>(values: &[V]) -> bool {
    values
        .iter()
        .enumerate()
        .any(|(i, v)| values[..i].contains(v))
}

impl<K, V> Default for MultiValueMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Clone for MultiValueMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            policy: self.policy,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.index.clone_from(&source.index);
        self.policy = source.policy;
    }
}

impl<K, V, S> fmt::Debug for MultiValueMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiValueMap")
            .field("policy", &self.policy)
            .field("entries", &self.index)
            .finish()
    }
}

impl<K, V, S> Extend<(K, V)> for MultiValueMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for MultiValueMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}
