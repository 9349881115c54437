//! Edge capture into a bus trace
//!
//! [`EdgeRecorder`] borrows a trace for the duration of one recording session
//! and appends an event for every level change it is notified of. Platform
//! glue forwards its edge interrupts to the recorder through [`EdgeSink`];
//! the trace's clock timestamps each event.
//!
//! # Example
//!
//! ```
//! use i2c_bus_trace::{BusLine, BusTrace, EdgeRecorder, EdgeSink, MockClock};
//!
//! let clock = MockClock::new(1);
//! let mut trace = BusTrace::with_clock(8, &clock);
//! {
//!     let mut recorder = EdgeRecorder::start(&mut trace, true, true);
//!     clock.advance(4_700);
//!     recorder.on_edge(BusLine::Sda, false);
//!     clock.advance(4_000);
//!     recorder.on_edge(BusLine::Scl, false);
//! }
//! assert_eq!(trace.len(), 3);
//! assert_eq!(trace.nanos_between(2, 1), 4_000);
//! ```
//!
//! # Interrupt delivery
//!
//! When edges arrive in interrupt context, install the sink in a
//! [`SharedEdgeSink`] and call [`SharedEdgeSink::deliver`] from the handler.
//! Capture must be stopped (the sink taken back) before the trace is read.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::trace::{BusEventFlags, BusTrace};
use crate::{BusLine, EdgeSink};

/// Records edge notifications into a trace
pub struct EdgeRecorder<'t, 'c> {
    trace: &'t mut BusTrace<'c>,
    levels: BusEventFlags,
}

impl<'t, 'c> EdgeRecorder<'t, 'c> {
    /// Reset `trace` and record the initial line levels
    pub fn start(trace: &'t mut BusTrace<'c>, sda: bool, scl: bool) -> Self {
        trace.reset();
        let levels = BusEventFlags::from_levels(sda, scl);
        trace.record(levels);
        log_trace!("edge recorder started, SDA {} SCL {}", sda, scl);
        Self { trace, levels }
    }

    /// Line levels after the last recorded edge
    pub fn levels(&self) -> (bool, bool) {
        (self.levels.sda(), self.levels.scl())
    }

    /// Number of events recorded so far, including the initial marker
    pub fn len(&self) -> usize {
        self.trace.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    /// End the session, returning the number of events recorded
    pub fn finish(self) -> usize {
        log_trace!(
            "edge recorder finished, {} events, {} dropped",
            self.trace.len(),
            self.trace.dropped_events()
        );
        self.trace.len()
    }
}

impl EdgeSink for EdgeRecorder<'_, '_> {
    fn on_edge(&mut self, line: BusLine, level: bool) {
        let current = match line {
            BusLine::Sda => self.levels.sda(),
            BusLine::Scl => self.levels.scl(),
        };
        if current == level {
            return;
        }
        let flags = self.levels.with_line(line, level);
        self.levels = flags.levels();
        self.trace.record(flags);
    }
}

// ============================================================================
// Interrupt-safe sink slot
// ============================================================================

/// Edge sink slot shared between an edge interrupt and the owning task
///
/// Delivery and installation run inside a critical section.
pub struct SharedEdgeSink<S> {
    sink: Mutex<RefCell<Option<S>>>,
}

impl<S> Default for SharedEdgeSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SharedEdgeSink<S> {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            sink: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install `sink`, returning the one it replaces
    pub fn install(&self, sink: S) -> Option<S> {
        critical_section::with(|cs| self.sink.borrow_ref_mut(cs).replace(sink))
    }

    /// Remove the installed sink; edges delivered afterwards are discarded
    pub fn take(&self) -> Option<S> {
        critical_section::with(|cs| self.sink.borrow_ref_mut(cs).take())
    }

    /// Whether a sink is installed
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.sink.borrow_ref(cs).is_some())
    }

    /// Run `f` on the installed sink
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        critical_section::with(|cs| self.sink.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<S: EdgeSink> SharedEdgeSink<S> {
    /// Forward an edge to the installed sink; returns whether one was installed
    pub fn deliver(&self, line: BusLine, level: bool) -> bool {
        self.with(|sink| sink.on_edge(line, level)).is_some()
    }
}
