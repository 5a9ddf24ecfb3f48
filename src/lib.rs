//! multi-toolbox: two small, independent containers for reuse inside larger
//! applications.
//!
//! - [`MultiValueMap`]: one key to an ordered list of values, with a
//!   per-instance duplicate policy.
//! - [`BoundedSignedCounter`]: a signed counter with hard bounds, shared
//!   across threads, that blocks instead of leaving its range.
//!
//! Internal Design:
//!
//! Summary
//! - MultiValueMap is built in two layers:
//!   - KeyIndex<K, T, S>: structural map from each distinct key to one
//!     owned payload. A `hashbrown::HashTable` indexes `slotmap` storage;
//!     each slot keeps its precomputed hash so unlinking never rehashes.
//!   - MultiValueMap<K, V, S>: uses `Vec<V>` payloads and owns the value
//!     policy: duplicate suppression, pruning of emptied keys, counting,
//!     deep copy.
//! - BoundedSignedCounter is a mutex-guarded slot pool with a condition
//!   variable that is notified on every change.
//!
//! MultiValueMap invariants
//! - A key is present iff it holds at least one value once a mutating call
//!   returns; emptied keys are pruned on the spot.
//! - Under `DuplicatePolicy::Reject` no key holds the same value twice.
//! - The number of listed keys equals `count()`.
//! - `Clone` is deep: payloads are owned `Vec`s, so nothing is shared.
//! - These are checked with debug assertions after each mutation and cost
//!   nothing in release builds.
//!
//! Counter contract
//! - Values live in `[lower, upper]`, `[-2_000_000, 2_000_000]` by default.
//!   The pool spans `upper - lower` slots and 0 sits at slot `-lower`.
//! - `increment_by`/`decrement_by` treat leaving the range as a caller bug:
//!   debug builds assert, release builds wait for another thread to make room.
//!   There is no cancellation on that path.
//! - `try_*` and `*_timeout` variants report `CounterError` instead and are
//!   opt-in.
//!
//! Diagnostics
//! - `tracing` target `multi_toolbox::multi_value_map`: WARN on a rejected
//!   duplicate insert (debug builds only).
//! - `tracing` target `multi_toolbox::counter`: TRACE on each increment with
//!   the count before it; DEBUG when a timed move gives up.
//!
//! Notes and non-goals
//! - MultiValueMap is not synchronized; wrap it if you share it.
//! - No ordering across keys, no borrowing iterators over the map; reads
//!   hand out copies or a borrowed slice for a single key.
//! - No fairness between threads waiting on the counter beyond what
//!   `parking_lot` gives.

pub mod counter;
mod key_index;
pub mod multi_value_map;
mod multi_value_map_proptest;

// Public surface
pub use counter::{BoundedSignedCounter, CounterError, CounterLimits, LOWER_LIMIT, UPPER_LIMIT};
pub use multi_value_map::{DuplicatePolicy, MultiValueMap};
