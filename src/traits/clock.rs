//! Clock abstraction for tick-based timestamping.
//!
//! Capture engines timestamp edges with a free-running hardware counter. The
//! `Clock` trait exposes that counter and its conversion to nanoseconds so the
//! trace and the bus monitor can measure intervals without knowing the
//! platform.

use core::cell::Cell;

use crate::{Nanos, Ticks, UNKNOWN_NANOS};

/// Platform-agnostic monotonic tick counter.
///
/// The counter is allowed to wrap. All interval queries use wrapping
/// subtraction, so an interval is correct as long as it is shorter than one
/// full counter period.
///
/// # Example
///
/// ```
/// use i2c_bus_trace::traits::{Clock, MockClock};
///
/// let clock = MockClock::new(10); // 10 ns per tick
/// let then = clock.now();
/// clock.advance(25);
/// assert_eq!(clock.nanos_since(then), 250);
/// ```
pub trait Clock {
    /// Returns the current value of the tick counter.
    fn now(&self) -> Ticks;

    /// Converts a tick count to nanoseconds.
    ///
    /// Returns [`UNKNOWN_NANOS`] if the result does not fit.
    fn ticks_to_nanos(&self, ticks: Ticks) -> Nanos;

    /// Returns the number of ticks from `from` to `to`, wraparound-safe.
    ///
    /// Counters narrower than 32 bits must override this to mask the result.
    fn ticks_between(&self, from: Ticks, to: Ticks) -> Ticks {
        to.wrapping_sub(from)
    }

    /// Returns the ticks elapsed since `then`.
    fn ticks_since(&self, then: Ticks) -> Ticks {
        self.ticks_between(then, self.now())
    }

    /// Returns the nanoseconds from `from` to `to`.
    fn nanos_between(&self, from: Ticks, to: Ticks) -> Nanos {
        self.ticks_to_nanos(self.ticks_between(from, to))
    }

    /// Returns the nanoseconds elapsed since `then`.
    fn nanos_since(&self, then: Ticks) -> Nanos {
        self.ticks_to_nanos(self.ticks_since(then))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Ticks {
        (**self).now()
    }

    fn ticks_to_nanos(&self, ticks: Ticks) -> Nanos {
        (**self).ticks_to_nanos(ticks)
    }

    fn ticks_between(&self, from: Ticks, to: Ticks) -> Ticks {
        (**self).ticks_between(from, to)
    }
}

// ============================================================================
// Synthetic clock (traces whose deltas are already in nanoseconds)
// ============================================================================

/// Clock for synthesized traces where one tick equals one nanosecond.
///
/// The counter never advances; it only provides the identity conversion so
/// that traces produced by the builder can answer interval queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntheticClock;

/// Shared instance referenced by synthesized traces.
pub static SYNTHETIC_CLOCK: SyntheticClock = SyntheticClock;

impl Clock for SyntheticClock {
    fn now(&self) -> Ticks {
        0
    }

    fn ticks_to_nanos(&self, ticks: Ticks) -> Nanos {
        ticks
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock clock with controllable time advancement.
///
/// Time only moves when the test calls [`MockClock::advance`] or
/// [`MockClock::set`], which makes timeout logic deterministic.
///
/// # Example
///
/// ```
/// use i2c_bus_trace::traits::{Clock, MockClock};
///
/// let clock = MockClock::new(1);
/// assert_eq!(clock.now(), 0);
///
/// clock.advance(1000);
/// assert_eq!(clock.now(), 1000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    ticks: Cell<Ticks>,
    nanos_per_tick: Nanos,
}

impl MockClock {
    /// Creates a new `MockClock` at tick 0 with the given resolution.
    pub fn new(nanos_per_tick: Nanos) -> Self {
        Self {
            ticks: Cell::new(0),
            nanos_per_tick,
        }
    }

    /// Creates a new `MockClock` starting at the specified tick.
    pub fn with_initial(nanos_per_tick: Nanos, ticks: Ticks) -> Self {
        Self {
            ticks: Cell::new(ticks),
            nanos_per_tick,
        }
    }

    /// Sets the tick counter to an absolute value.
    pub fn set(&self, ticks: Ticks) {
        self.ticks.set(ticks);
    }

    /// Advances the tick counter, wrapping like a hardware counter.
    pub fn advance(&self, ticks: Ticks) {
        self.ticks.set(self.ticks.get().wrapping_add(ticks));
    }

    /// Advances the tick counter by at least `nanos`.
    pub fn advance_nanos(&self, nanos: Nanos) {
        let per_tick = self.nanos_per_tick.max(1);
        self.advance(nanos.div_ceil(per_tick));
    }
}

impl Clock for MockClock {
    fn now(&self) -> Ticks {
        self.ticks.get()
    }

    fn ticks_to_nanos(&self, ticks: Ticks) -> Nanos {
        ticks
            .checked_mul(self.nanos_per_tick)
            .unwrap_or(UNKNOWN_NANOS)
    }
}
