//! Bus traces
//!
//! A [`BusTrace`] is a capped, append-only log of [`BusEvent`]s. Capture
//! engines append to it while edges occur; once capture has stopped the trace
//! is analysed, normalized or compared.
//!
//! # Capacity
//!
//! Capacity is fixed at construction. Events appended beyond it are dropped
//! without error so that an overrun can never corrupt recorded history. Size
//! buffers with [`BusTrace::max_events_required`].
//!
//! # Timing
//!
//! Events store tick deltas. A trace optionally borrows a [`Clock`] which is
//! used to self-timestamp events from raw tick counts and to convert deltas to
//! nanoseconds. Without a clock every interval query yields
//! [`UNKNOWN_NANOS`].
//!
//! # Concurrency
//!
//! A trace is not designed for concurrent append and read. Analysis must only
//! begin after capture has fully stopped.

mod codec;
mod error;
mod event;
mod message;
mod render;

use alloc::vec::Vec;
use core::fmt;

use crate::traits::clock::SYNTHETIC_CLOCK;
use crate::{Clock, Nanos, Ticks, UNKNOWN_NANOS};

pub use error::TraceError;
pub use event::{BusEvent, BusEventFlags};

/// Events recorded for one data bit in the worst case (SDA change, SCL rise, SCL fall)
pub const EVENTS_PER_BIT: usize = 3;

/// Bits clocked per byte including the ACK/NACK bit
pub const BITS_PER_BYTE: usize = 9;

/// Allowance per byte for the SDA hand-over between transmitter and receiver
pub const EXTRA_EVENTS_PER_BYTE: usize = 1;

/// Events for the initial marker, START and STOP conditions
pub const FRAMING_EVENTS: usize = 4;

/// Capped, append-only sequence of bus events
#[derive(Clone)]
pub struct BusTrace<'c> {
    events: Vec<BusEvent>,
    max_len: usize,
    clock: Option<&'c dyn Clock>,
    last_ticks: Option<Ticks>,
    dropped: usize,
}

impl<'c> BusTrace<'c> {
    /// Create an empty trace without a clock
    pub fn new(max_len: usize) -> Self {
        Self {
            events: Vec::with_capacity(max_len),
            max_len,
            clock: None,
            last_ticks: None,
            dropped: 0,
        }
    }

    /// Create an empty trace timed by `clock`
    pub fn with_clock(max_len: usize, clock: &'c dyn Clock) -> Self {
        Self {
            clock: Some(clock),
            ..Self::new(max_len)
        }
    }

    /// Worst-case event count for a message carrying `bytes` data bytes
    /// after its address byte.
    ///
    /// Pin-level tracking doubles the per-byte events.
    pub const fn max_events_required(bytes: usize, track_pins: bool) -> usize {
        let per_byte = BITS_PER_BYTE * EVENTS_PER_BIT + EXTRA_EVENTS_PER_BYTE;
        let mut events = (bytes + 1) * per_byte;
        if track_pins {
            events *= 2;
        }
        events + FRAMING_EVENTS
    }

    /// Clock used for timestamping and conversions, if any
    pub fn clock(&self) -> Option<&'c dyn Clock> {
        self.clock
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of events this trace accepts
    pub fn capacity(&self) -> usize {
        self.max_len
    }

    /// Whether further events will be dropped
    pub fn is_full(&self) -> bool {
        self.events.len() >= self.max_len
    }

    /// Number of events dropped since the last reset because the trace was full
    pub fn dropped_events(&self) -> usize {
        self.dropped
    }

    /// Recorded events in order
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Iterate over recorded events
    pub fn iter(&self) -> core::slice::Iter<'_, BusEvent> {
        self.events.iter()
    }

    /// Event at `index`, or `None` when out of range
    pub fn event(&self, index: usize) -> Option<BusEvent> {
        self.events.get(index).copied()
    }

    /// Last recorded event
    pub fn last(&self) -> Option<BusEvent> {
        self.events.last().copied()
    }

    /// Append an event; a no-op once the trace is full
    pub fn add_event(&mut self, event: BusEvent) {
        if self.events.len() < self.max_len {
            self.events.push(event);
            return;
        }
        if self.dropped == 0 {
            log_trace!("bus trace full at {} events, dropping", self.max_len);
        }
        self.dropped = self.dropped.saturating_add(1);
    }

    /// Append an event timestamped with a raw tick count.
    ///
    /// The delta is measured from the previous timestamp; the first event
    /// after construction or [`reset`](Self::reset) gets a delta of 0.
    pub fn add_event_at(&mut self, ticks: Ticks, flags: BusEventFlags) {
        let delta = match (self.last_ticks, self.clock) {
            (Some(last), Some(clock)) => clock.ticks_between(last, ticks),
            (Some(last), None) => ticks.wrapping_sub(last),
            (None, _) => 0,
        };
        self.last_ticks = Some(ticks);
        self.add_event(BusEvent::new(delta, flags));
    }

    /// Append an event timestamped with the clock's current tick count.
    ///
    /// Without a clock the event is appended with a delta of 0.
    pub fn record(&mut self, flags: BusEventFlags) {
        match self.clock {
            Some(clock) => self.add_event_at(clock.now(), flags),
            None => self.add_event(BusEvent::new(0, flags)),
        }
    }

    /// Discard all events and re-base tick tracking
    pub fn reset(&mut self) {
        self.events.clear();
        self.last_ticks = None;
        self.dropped = 0;
    }

    /// Nanoseconds between event `index` and its predecessor.
    ///
    /// The first event's time to previous is 0. Returns [`UNKNOWN_NANOS`] if
    /// `index` is out of range or the trace has no clock.
    pub fn nanos_to_previous(&self, index: usize) -> Nanos {
        match (self.events.get(index), self.clock) {
            (Some(_), Some(_)) if index == 0 => 0,
            (Some(event), Some(clock)) => clock.ticks_to_nanos(event.delta),
            _ => UNKNOWN_NANOS,
        }
    }

    /// Nanoseconds from event `from` to event `to`.
    ///
    /// Returns [`UNKNOWN_NANOS`] if either index is out of range, `from > to`,
    /// the trace has no clock or the interval does not fit.
    pub fn nanos_between(&self, to: usize, from: usize) -> Nanos {
        let Some(clock) = self.clock else {
            return UNKNOWN_NANOS;
        };
        if from > to || to >= self.events.len() {
            return UNKNOWN_NANOS;
        }
        let ticks: u64 = self.events[from + 1..=to]
            .iter()
            .map(|event| u64::from(event.delta))
            .sum();
        match Ticks::try_from(ticks) {
            Ok(ticks) => clock.ticks_to_nanos(ticks),
            Err(_) => UNKNOWN_NANOS,
        }
    }

    /// Reassemble a trace from its parts, keeping at least `max_len` capacity
    pub(crate) fn from_events(
        events: Vec<BusEvent>,
        max_len: usize,
        clock: Option<&'c dyn Clock>,
    ) -> Self {
        Self {
            max_len: max_len.max(events.len()),
            events,
            clock,
            last_ticks: None,
            dropped: 0,
        }
    }
}

impl BusTrace<'static> {
    /// Create an empty trace whose deltas are nanoseconds
    pub fn synthetic(max_len: usize) -> Self {
        Self::with_clock(max_len, &SYNTHETIC_CLOCK)
    }
}

impl fmt::Debug for BusTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusTrace")
            .field("max_len", &self.max_len)
            .field("has_clock", &self.clock.is_some())
            .field("dropped", &self.dropped)
            .field("events", &self.events)
            .finish()
    }
}

impl<'a> IntoIterator for &'a BusTrace<'_> {
    type Item = &'a BusEvent;
    type IntoIter = core::slice::Iter<'a, BusEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
