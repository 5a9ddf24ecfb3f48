//! BoundedSignedCounter: a thread-safe signed counter over a bounded slot pool.
//!
//! The pool holds `upper - lower` slots. Raising the count acquires slots,
//! lowering it releases them, and the represented value is the number of
//! acquired slots minus a fixed zero offset. Acquiring past the pool's
//! capacity waits for another thread to release; releasing more than is held
//! waits for another thread to acquire. Both waits only happen when a caller
//! has broken the range contract, which debug builds catch with an assertion
//! before blocking.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::time::{Duration, Instant};

/// Lowest value of the reference configuration.
pub const LOWER_LIMIT: i32 = -2_000_000;
/// Highest value of the reference configuration.
pub const UPPER_LIMIT: i32 = 2_000_000;

/// Closed range `[lower, upper]` a counter may hold. Must contain 0.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CounterLimits {
    pub lower: i32,
    pub upper: i32,
}

impl CounterLimits {
    pub const fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    /// Symmetric range `[-bound, bound]`.
    pub const fn symmetric(bound: i32) -> Self {
        Self::new(-bound, bound)
    }

    /// Number of slots the pool needs to cover the range.
    pub fn span(&self) -> u64 {
        (i64::from(self.upper) - i64::from(self.lower)) as u64
    }

    pub fn contains(&self, value: i32) -> bool {
        self.lower <= value && value <= self.upper
    }

    fn contains_wide(&self, value: i64) -> bool {
        i64::from(self.lower) <= value && value <= i64::from(self.upper)
    }
}

impl Default for CounterLimits {
    fn default() -> Self {
        Self::new(LOWER_LIMIT, UPPER_LIMIT)
    }
}

/// Failure of the opt-in non-blocking and timed operations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterError {
    #[error("moving count {current} by {delta} leaves the range [{lower}, {upper}]")]
    OutOfRange {
        current: i32,
        delta: i64,
        lower: i32,
        upper: i32,
    },
    #[error("timed out after {waited:?} moving count {current} by {delta}")]
    Timeout {
        current: i32,
        delta: i64,
        waited: Duration,
    },
}

/// Signed counter in a fixed range, safe to share between threads.
///
/// `increment_by`/`decrement_by` are the contract path: moving out of range is
/// a bug in the caller and trips a debug assertion. The `try_*` and `*_timeout`
/// variants are for callers that want to handle the bounds themselves.
pub struct BoundedSignedCounter {
    limits: CounterLimits,
    capacity: u64,
    /// Slot count that represents 0. Fixed after construction.
    zero: u64,
    acquired: Mutex<u64>,
    changed: Condvar,
}

impl BoundedSignedCounter {
    /// Counter over the reference range, starting at `initial`.
    ///
    /// # Panics
    /// If `initial` lies outside `[LOWER_LIMIT, UPPER_LIMIT]`.
    pub fn new(initial: i32) -> Self {
        Self::with_limits(CounterLimits::default(), initial)
    }

    /// Counter over `limits`, starting at `initial`.
    ///
    /// # Panics
    /// If `limits` does not contain 0 or `initial` lies outside `limits`.
    pub fn with_limits(limits: CounterLimits, initial: i32) -> Self {
        assert!(
            limits.contains(0),
            "counter limits [{}, {}] must contain zero",
            limits.lower,
            limits.upper
        );
        assert!(
            limits.contains(initial),
            "initial count {} outside [{}, {}]",
            initial,
            limits.lower,
            limits.upper
        );
        let zero = limits.lower.unsigned_abs() as u64;
        let counter = Self {
            limits,
            capacity: limits.span(),
            zero,
            acquired: Mutex::new(zero),
            changed: Condvar::new(),
        };
        debug_assert_eq!(counter.count(), 0);
        if initial > 0 {
            counter.increment_by(initial.unsigned_abs());
        } else if initial < 0 {
            counter.decrement_by(initial.unsigned_abs());
        }
        debug_assert_eq!(counter.count(), initial);
        counter
    }

    pub fn limits(&self) -> CounterLimits {
        self.limits
    }

    /// Current value. Takes the lock briefly but never waits for capacity.
    pub fn count(&self) -> i32 {
        self.value_at(*self.acquired.lock())
    }

    pub fn increment(&self) {
        self.increment_by(1)
    }

    pub fn decrement(&self) {
        self.decrement_by(1)
    }

    /// Raises the count by `n`, waiting until `n` slots are free.
    ///
    /// The result must not exceed the upper limit; debug builds assert this.
    pub fn increment_by(&self, n: u32) {
        let need = u64::from(n);
        let mut acquired = self.acquired.lock();
        let before = self.value_at(*acquired);
        tracing::trace!(target: "multi_toolbox::counter", count = before, n, "increment");
        debug_assert!(
            i64::from(before) + i64::from(n) <= i64::from(self.limits.upper),
            "increment by {} from {} exceeds upper limit {}",
            n,
            before,
            self.limits.upper
        );
        while self.capacity - *acquired < need {
            self.changed.wait(&mut acquired);
        }
        *acquired += need;
        self.changed.notify_all();
    }

    /// Lowers the count by `n`, waiting until `n` slots are held.
    ///
    /// The result must not fall below the lower limit; debug builds assert this.
    pub fn decrement_by(&self, n: u32) {
        let need = u64::from(n);
        let mut acquired = self.acquired.lock();
        let before = self.value_at(*acquired);
        debug_assert!(
            i64::from(before) - i64::from(n) >= i64::from(self.limits.lower),
            "decrement by {} from {} falls below lower limit {}",
            n,
            before,
            self.limits.lower
        );
        while *acquired < need {
            self.changed.wait(&mut acquired);
        }
        *acquired -= need;
        self.changed.notify_all();
    }

    /// Raises the count by `n` if the result stays in range; never waits.
    pub fn try_increment_by(&self, n: u32) -> Result<(), CounterError> {
        self.try_move(i64::from(n))
    }

    /// Lowers the count by `n` if the result stays in range; never waits.
    pub fn try_decrement_by(&self, n: u32) -> Result<(), CounterError> {
        self.try_move(-i64::from(n))
    }

    /// Raises the count by `n`, waiting at most `timeout` for room.
    pub fn increment_by_timeout(&self, n: u32, timeout: Duration) -> Result<(), CounterError> {
        self.move_within(i64::from(n), timeout)
    }

    /// Lowers the count by `n`, waiting at most `timeout` for room.
    pub fn decrement_by_timeout(&self, n: u32, timeout: Duration) -> Result<(), CounterError> {
        self.move_within(-i64::from(n), timeout)
    }

    fn value_at(&self, acquired: u64) -> i32 {
        (acquired as i64 - self.zero as i64) as i32
    }

    fn slots_after(&self, acquired: u64, delta: i64) -> Option<u64> {
        let next = acquired as i64 + delta;
        (0..=self.capacity as i64).contains(&next).then_some(next as u64)
    }

    fn out_of_range(&self, acquired: u64, delta: i64) -> CounterError {
        CounterError::OutOfRange {
            current: self.value_at(acquired),
            delta,
            lower: self.limits.lower,
            upper: self.limits.upper,
        }
    }

    fn try_move(&self, delta: i64) -> Result<(), CounterError> {
        let mut acquired = self.acquired.lock();
        let next = self
            .slots_after(*acquired, delta)
            .ok_or_else(|| self.out_of_range(*acquired, delta))?;
        debug_assert!(self.limits.contains_wide(i64::from(self.value_at(next))));
        *acquired = next;
        self.changed.notify_all();
        Ok(())
    }

    fn move_within(&self, delta: i64, timeout: Duration) -> Result<(), CounterError> {
        let mut acquired = self.acquired.lock();
        if delta.unsigned_abs() > self.capacity {
            return Err(self.out_of_range(*acquired, delta));
        }
        let started = Instant::now();
        // A deadline past what `Instant` can represent means wait indefinitely.
        let deadline = started.checked_add(timeout);
        let next = loop {
            if let Some(next) = self.slots_after(*acquired, delta) {
                break next;
            }
            let timed_out = match deadline {
                Some(deadline) => self.changed.wait_until(&mut acquired, deadline).timed_out(),
                None => {
                    self.changed.wait(&mut acquired);
                    false
                }
            };
            if timed_out {
                if let Some(next) = self.slots_after(*acquired, delta) {
                    break next;
                }
                tracing::debug!(
                    target: "multi_toolbox::counter",
                    count = self.value_at(*acquired),
                    delta,
                    "timed out waiting for room"
                );
                return Err(CounterError::Timeout {
                    current: self.value_at(*acquired),
                    delta,
                    waited: started.elapsed(),
                });
            }
        };
        *acquired = next;
        self.changed.notify_all();
        Ok(())
    }
}

impl Default for BoundedSignedCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Debug for BoundedSignedCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedSignedCounter")
            .field("count", &self.count())
            .field("limits", &self.limits)
            .finish()
    }
}
