//! Reference trace synthesis
//!
//! [`BusTraceBuilder`] emits the line transitions a conforming master would
//! produce for a sequence of protocol operations, timed from a specification
//! table. The result is a synthetic trace (1 tick = 1 ns) suitable as a
//! comparison reference for captured traces and for exercising the analyser.
//!
//! With [`EdgeTimes`] configured, each delta is the trigger-to-trigger time
//! that the [`I2cTimingAnalyser`](crate::I2cTimingAnalyser) calibrates back
//! to the chosen interval.
//!
//! # Example
//!
//! ```
//! use i2c_bus_trace::{BusTrace, BusTraceBuilder, TimingStrategy, STANDARD_MODE};
//!
//! let mut builder = BusTraceBuilder::new(
//!     STANDARD_MODE,
//!     TimingStrategy::Min,
//!     BusTrace::max_events_required(1, false),
//! );
//! builder
//!     .bus_initially_idle()
//!     .start_bit()
//!     .address_byte(0x50, false)
//!     .ack()
//!     .data_byte(0xA5)
//!     .nack()
//!     .stop_bit();
//! assert!(!builder.trace().is_full());
//! ```

use crate::analysis::{Adjuster, Edge, EdgeTimes};
use crate::specification::{I2cMasterSpecification, SpecRange};
use crate::trace::{BusEvent, BusEventFlags, BusTrace};
use crate::{BusLine, Nanos};

/// Which end of each specification window the builder uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingStrategy {
    /// Each interval at its minimum legal value
    #[default]
    Min,
    /// Each interval at its maximum legal value; windows without an upper
    /// bound use twice their minimum
    Max,
}

impl TimingStrategy {
    /// Interval chosen from `range`
    pub const fn pick(&self, range: SpecRange) -> Nanos {
        match self {
            TimingStrategy::Min => range.min,
            TimingStrategy::Max if range.is_bounded() => range.max,
            TimingStrategy::Max => range.min.saturating_mul(2),
        }
    }
}

/// Synthesizes bus traces from protocol operations
#[derive(Debug, Clone)]
pub struct BusTraceBuilder {
    trace: BusTrace<'static>,
    spec: I2cMasterSpecification,
    strategy: TimingStrategy,
    adjuster: Adjuster,
}

impl BusTraceBuilder {
    /// Create a builder with ideal line edges and room for `max_len` events
    pub fn new(spec: I2cMasterSpecification, strategy: TimingStrategy, max_len: usize) -> Self {
        Self {
            trace: BusTrace::synthetic(max_len),
            spec,
            strategy,
            adjuster: Adjuster::default(),
        }
    }

    /// Synthesize edges with the given transition times
    pub fn with_edge_times(mut self, edges: EdgeTimes) -> Self {
        self.adjuster = Adjuster::new(edges);
        self
    }

    /// Trace built so far
    pub fn trace(&self) -> &BusTrace<'static> {
        &self.trace
    }

    /// Consume the builder, returning its trace
    pub fn into_trace(self) -> BusTrace<'static> {
        self.trace
    }

    /// Emit the initial marker with both lines high
    pub fn bus_initially_idle(&mut self) -> &mut Self {
        self.trace.add_event(BusEvent::initial(true, true));
        self
    }

    /// Emit a START, or a repeated START when SCL is low
    pub fn start_bit(&mut self) -> &mut Self {
        if self.trace.is_empty() {
            self.bus_initially_idle();
        }
        let (sda, scl) = self.levels();

        if !scl {
            // Repeated START: release SDA, then SCL, then pull SDA low
            let held = if sda { 0 } else { self.drive_sda(true) };
            let low = self.raw(self.spec.clock_low_time, Edge::SclFall, Edge::SclRise);
            self.emit(low.saturating_sub(held), BusLine::Scl, true);
            let setup = self.raw(self.spec.start_setup_time, Edge::SclRise, Edge::SdaFall);
            self.emit(setup, BusLine::Sda, false);
        } else {
            if !sda {
                // START held without a clock: finish it with a STOP first
                let setup = self.raw(self.spec.stop_setup_time, Edge::SclRise, Edge::SdaRise);
                self.emit(setup, BusLine::Sda, true);
            }
            let after_stop = self.trace.last().is_some_and(|event| event.flags.sda_rose());
            let delay = if after_stop {
                self.raw(self.spec.bus_free_time, Edge::SdaRise, Edge::SdaFall)
            } else {
                // no bus free time applies to the first START after idle
                self.adjuster.trigger_offset(Edge::SdaFall)
            };
            self.emit(delay, BusLine::Sda, false);
        }

        let hold = self.raw(self.spec.start_hold_time, Edge::SdaFall, Edge::SclFall);
        self.emit(hold, BusLine::Scl, false);
        self
    }

    /// Emit a STOP after the ACK/NACK bit
    pub fn stop_bit(&mut self) -> &mut Self {
        let (sda, _) = self.levels();
        let held = if sda { self.drive_sda(false) } else { 0 };
        let low = self.raw(self.spec.clock_low_time, Edge::SclFall, Edge::SclRise);
        self.emit(low.saturating_sub(held), BusLine::Scl, true);
        let setup = self.raw(self.spec.stop_setup_time, Edge::SclRise, Edge::SdaRise);
        self.emit(setup, BusLine::Sda, true);
        self
    }

    /// Emit one data bit: SDA settles while SCL is low, then one SCL pulse
    pub fn data_bit(&mut self, value: bool) -> &mut Self {
        let (sda, _) = self.levels();
        let held = if sda != value { self.drive_sda(value) } else { 0 };
        let low = self.raw(self.spec.clock_low_time, Edge::SclFall, Edge::SclRise);
        self.emit(low.saturating_sub(held), BusLine::Scl, true);
        let high = self.raw(self.spec.clock_high_time, Edge::SclRise, Edge::SclFall);
        self.emit(high, BusLine::Scl, false);
        self
    }

    /// Receiver acknowledges: SDA low during the ninth clock
    pub fn ack(&mut self) -> &mut Self {
        self.data_bit(false)
    }

    /// Receiver does not acknowledge: SDA released during the ninth clock
    pub fn nack(&mut self) -> &mut Self {
        self.data_bit(true)
    }

    /// Emit a 7-bit address with the read/write bit
    pub fn address_byte(&mut self, address: u8, read: bool) -> &mut Self {
        self.data_byte((address << 1) | u8::from(read))
    }

    /// Emit eight data bits, most significant first
    pub fn data_byte(&mut self, value: u8) -> &mut Self {
        for bit in (0..8).rev() {
            self.data_bit(value & (1 << bit) != 0);
        }
        self
    }

    /// Current line levels, both high before the first event
    fn levels(&self) -> (bool, bool) {
        self.trace
            .last()
            .map_or((true, true), |event| (event.flags.sda(), event.flags.scl()))
    }

    /// Change SDA one data hold time after the last SCL fall; returns the delta used
    fn drive_sda(&mut self, level: bool) -> Nanos {
        let hold = self.raw(self.spec.slave.data_hold_time, Edge::SclFall, Edge::sda(level));
        self.emit(hold, BusLine::Sda, level);
        hold
    }

    /// Trigger-to-trigger delta for `range` bounded by `from` and `to`
    fn raw(&self, range: SpecRange, from: Edge, to: Edge) -> Nanos {
        self.adjuster.unadjust(self.strategy.pick(range), from, to)
    }

    fn emit(&mut self, delta: Nanos, line: BusLine, level: bool) {
        let flags = self
            .trace
            .last()
            .map_or_else(|| BusEventFlags::from_levels(true, true), |event| event.flags);
        self.trace.add_event(BusEvent::new(delta, flags.with_line(line, level)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specification::STANDARD_MODE;

    fn builder() -> BusTraceBuilder {
        BusTraceBuilder::new(STANDARD_MODE, TimingStrategy::Min, 128)
    }

    fn deltas(trace: &BusTrace<'_>) -> Vec<u32> {
        trace.iter().map(|event| event.delta).collect()
    }

    #[test]
    fn test_strategy_pick() {
        assert_eq!(TimingStrategy::Min.pick(SpecRange::new(0, 3_450)), 0);
        assert_eq!(TimingStrategy::Max.pick(SpecRange::new(0, 3_450)), 3_450);
        assert_eq!(TimingStrategy::Max.pick(SpecRange::at_least(4_700)), 9_400);
    }

    #[test]
    fn test_start_from_idle() {
        let mut b = builder();
        b.bus_initially_idle().start_bit();
        let trace = b.trace();

        assert_eq!(deltas(trace), vec![0, 0, 4_000]);
        assert!(trace.event(1).is_some_and(|e| e.flags.sda_fell() && e.flags.scl()));
        assert!(trace.event(2).is_some_and(|e| e.flags.scl_fell() && !e.flags.sda()));
    }

    #[test]
    fn test_start_on_empty_trace_emits_idle_marker() {
        let mut b = builder();
        b.start_bit();
        assert_eq!(b.trace().len(), 3);
        assert_eq!(
            b.trace().event(0).map(|e| e.flags),
            Some(BusEventFlags::from_levels(true, true))
        );
    }

    #[test]
    fn test_data_bit_without_sda_change() {
        let mut b = builder();
        b.start_bit().data_bit(false);
        // SDA already low after START: single SCL pulse
        assert_eq!(deltas(b.trace())[3..], [4_700, 4_000]);
    }

    #[test]
    fn test_data_bit_with_sda_change() {
        let mut b = builder();
        b.start_bit().data_bit(true);
        let trace = b.trace();
        assert_eq!(deltas(trace)[3..], [0, 4_700, 4_000]);
        assert!(trace.event(3).is_some_and(|e| e.flags.sda_rose()));
    }

    #[test]
    fn test_address_byte_bit_order() {
        let mut b = builder();
        b.start_bit().address_byte(0x50, true);
        // 0x50 << 1 | 1 = 0b1010_0001
        let sda_at_rise: Vec<bool> = b
            .trace()
            .iter()
            .filter(|e| e.flags.scl_rose())
            .map(|e| e.flags.sda())
            .collect();
        assert_eq!(
            sda_at_rise,
            vec![true, false, true, false, false, false, false, true]
        );
    }

    #[test]
    fn test_ack_nack_and_stop() {
        let mut b = builder();
        b.start_bit().ack().stop_bit();
        let levels: Vec<(bool, bool)> = b
            .trace()
            .iter()
            .map(|e| (e.flags.sda(), e.flags.scl()))
            .collect();
        assert_eq!(levels.last(), Some(&(true, true)));
        assert_eq!(deltas(b.trace())[5..], [4_700, 4_000]);

        let mut b = builder();
        b.start_bit().nack().stop_bit();
        // NACK left SDA high: STOP pulls it low after the hold time first
        assert!(b.trace().iter().rev().nth(2).is_some_and(|e| e.flags.sda_fell()));
    }

    #[test]
    fn test_repeated_start() {
        let mut b = builder();
        b.start_bit().ack().start_bit();
        let trace = b.trace();
        let tail: Vec<BusEventFlags> = trace.iter().skip(5).map(|e| e.flags).collect();

        assert!(tail[0].sda_rose() && !tail[0].scl());
        assert!(tail[1].scl_rose());
        assert!(tail[2].sda_fell() && tail[2].scl());
        assert!(tail[3].scl_fell());
        assert_eq!(deltas(trace)[5..], [0, 4_700, 4_700, 4_000]);
    }

    #[test]
    fn test_edge_times_inflate_deltas() {
        let mut b = builder().with_edge_times(EdgeTimes::symmetric(1_000, 300));
        b.start_bit();
        // SDA fall/2 after idle, tHD;STA 4000 + 150 + 150
        assert_eq!(deltas(b.trace()), vec![0, 150, 4_300]);
    }

    #[test]
    fn test_bus_free_time_only_after_stop() {
        let mut b = builder().with_edge_times(EdgeTimes::symmetric(1_000, 300));
        b.start_bit().ack().stop_bit().start_bit();
        let trace = b.trace();
        let restart = trace.len() - 2;
        assert!(trace.event(restart - 1).is_some_and(|e| e.flags.sda_rose()));
        assert!(trace.event(restart).is_some_and(|e| e.flags.sda_fell() && e.flags.scl()));
        // tBUF 4700 + SDA rise/2 + SDA fall/2
        assert_eq!(trace.event(restart).map(|e| e.delta), Some(5_350));
    }

    #[test]
    fn test_start_with_sda_held_low_stops_first() {
        let mut b = builder();
        b.bus_initially_idle();
        b.emit(1_000, BusLine::Sda, false);
        b.start_bit();
        // STOP after tSU;STO, then START after tBUF
        assert_eq!(deltas(b.trace())[2..], [4_000, 4_700, 4_000]);
    }

    #[test]
    fn test_into_trace() {
        let mut b = builder();
        b.start_bit();
        let trace = b.into_trace();
        assert_eq!(trace.len(), 3);
    }
}
