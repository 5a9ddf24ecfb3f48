//! KeyIndex: structural layer mapping each distinct key to one owned payload.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

#[derive(Clone)]
struct Slot<K, T> {
    key: K,
    payload: T,
    hash: u64,
}

/// Hash index over slot storage. Slot keys stay valid across clones, so a
/// cloned index can reuse the cloned table as-is.
#[derive(Clone)]
pub(crate) struct KeyIndex<K, T, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Slot<K, T>>,
}

impl<K, T> KeyIndex<K, T> {
    pub(crate) fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, T, S> KeyIndex<K, T, S> {
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.debug_check();
    }

    /// Entries in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &T)> {
        self.slots.values().map(|s| (&s.key, &s.payload))
    }

    #[inline]
    pub(crate) fn debug_check(&self) {
        debug_assert_eq!(
            self.index.len(),
            self.slots.len(),
            "hash index and slot storage disagree on entry count"
        );
    }
}

impl<K, T, S> KeyIndex<K, T, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn slot_of<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&sk| {
                self.slots
                    .get(sk)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub(crate) fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.slot_of(q).is_some()
    }

    pub(crate) fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let sk = self.slot_of(q)?;
        self.slots.get(sk).map(|s| &s.payload)
    }

    pub(crate) fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let sk = self.slot_of(q)?;
        self.slots.get_mut(sk).map(|s| &mut s.payload)
    }

    /// Returns the payload for `key`, creating it with `make` when the key is
    /// absent. `make` only runs on the vacant path.
    pub(crate) fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let hash = self.make_hash(&key);
        let sk = match self.index.entry(
            hash,
            |&sk| self.slots.get(sk).map(|s| s.key == key).unwrap_or(false),
            |&sk| self.slots.get(sk).map(|s| s.hash).unwrap_or(0),
        ) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(v) => {
                let sk = self.slots.insert(Slot {
                    key,
                    payload: make(),
                    hash,
                });
                let _ = v.insert(sk);
                sk
            }
        };
        self.debug_check();
        &mut self.slots[sk].payload
    }

    /// Unlinks `q` from the index and hands back the owned key and payload.
    pub(crate) fn remove<Q>(&mut self, q: &Q) -> Option<(K, T)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let entry = self
            .index
            .find_entry(hash, |&sk| {
                self.slots
                    .get(sk)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .ok()?;
        let (sk, _) = entry.remove();
        let slot = self.slots.remove(sk)?;
        debug_assert_eq!(slot.hash, hash);
        self.debug_check();
        Some((slot.key, slot.payload))
    }
}

impl<K, T, S> fmt::Debug for KeyIndex<K, T, S>
where
    K: fmt::Debug,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
