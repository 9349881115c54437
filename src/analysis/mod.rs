//! I2C timing analysis
//!
//! A single pass over a completed [`BusTrace`] classifies every line
//! transition by the transition before it and accumulates the characteristic
//! I2C intervals into [`DurationStatistics`].
//!
//! # Classification
//!
//! | Transition | Predecessor | Interval |
//! |---|---|---|
//! | SCL rise | last SCL fall | tLOW |
//! | SCL rise | last SDA change since that fall | tSU;DAT |
//! | SCL fall | SCL rise | tHIGH, fSCL, SCL period |
//! | SCL fall | SDA fall with SCL high | tHD;STA |
//! | SDA rise, SCL high | any | tSU;STO |
//! | SDA fall, SCL high | SCL rise | tSU;STA |
//! | SDA fall, SCL high | SDA rise | tBUF |
//! | SDA change, SCL low | SCL fall alone | tHD;DAT, tVD;DAT |
//!
//! Events that change no line level (pin-only events) are skipped. Events
//! where both lines changed at once are counted in
//! [`I2cTimingAnalysis::merged_edges`] and classified by their SCL edge; an
//! SCL fall that also moved SDA closes the hold measurement for that low
//! period. Anything else is a malformed transition: it is logged, counted in
//! [`I2cTimingAnalysis::anomalies`] and the scan continues.
//!
//! No transaction boundaries are detected; statistics accumulate over every
//! bit and message in the trace.
//!
//! # Frequency
//!
//! fSCL is derived from the calibrated tLOW and tHIGH of each bit, so it
//! agrees with the low and high samples recorded beside it. The physical SCL
//! period, measured trigger to trigger without calibration, is kept in
//! [`I2cTimingAnalysis::clock_period`].

mod adjuster;

use core::fmt;

pub use adjuster::{Adjuster, Edge, EdgeTimes};

use crate::specification::I2cMasterSpecification;
use crate::statistics::DurationStatistics;
use crate::trace::{BusEventFlags, BusTrace};
use crate::{Nanos, UNKNOWN_NANOS};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Statistics of every interval measured in a trace
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct I2cTimingAnalysis {
    /// fSCL (Hz), one sample per data bit
    pub frequency: DurationStatistics,
    /// tLOW
    pub clock_low_time: DurationStatistics,
    /// tHIGH
    pub clock_high_time: DurationStatistics,
    /// tHD;STA
    pub start_hold_time: DurationStatistics,
    /// tSU;STA (repeated START only)
    pub start_setup_time: DurationStatistics,
    /// tSU;STO
    pub stop_setup_time: DurationStatistics,
    /// tHD;DAT
    pub data_hold_time: DurationStatistics,
    /// tSU;DAT
    pub data_setup_time: DurationStatistics,
    /// tBUF
    pub bus_free_time: DurationStatistics,
    /// tVD;DAT, derived from each data hold sample
    pub data_valid_time: DurationStatistics,
    /// Uncalibrated SCL period (ns), one sample per data bit
    pub clock_period: DurationStatistics,
    /// Events recording an SDA and an SCL edge at once
    pub merged_edges: u32,
    /// Malformed transitions encountered during the scan
    pub anomalies: u32,
}

impl I2cTimingAnalysis {
    /// Whether every measured interval lies within `spec`.
    ///
    /// Intervals without samples are not checked. The SCL period, merged
    /// edges and anomalies do not affect the result.
    pub fn meets_specification(&self, spec: &I2cMasterSpecification) -> bool {
        let checks = [
            (&self.frequency, spec.frequency),
            (&self.clock_low_time, spec.clock_low_time),
            (&self.clock_high_time, spec.clock_high_time),
            (&self.start_hold_time, spec.start_hold_time),
            (&self.start_setup_time, spec.start_setup_time),
            (&self.stop_setup_time, spec.stop_setup_time),
            (&self.bus_free_time, spec.bus_free_time),
            (&self.data_hold_time, spec.slave.data_hold_time),
            (&self.data_setup_time, spec.slave.data_setup_time),
            (&self.data_valid_time, spec.slave.data_valid_time),
        ];
        checks
            .iter()
            .all(|(stats, range)| stats.is_empty() || stats.meets_specification(*range))
    }
}

impl fmt::Display for I2cTimingAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("fSCL (Hz)", &self.frequency),
            ("tLOW", &self.clock_low_time),
            ("tHIGH", &self.clock_high_time),
            ("tHD;STA", &self.start_hold_time),
            ("tSU;STA", &self.start_setup_time),
            ("tSU;STO", &self.stop_setup_time),
            ("tHD;DAT", &self.data_hold_time),
            ("tSU;DAT", &self.data_setup_time),
            ("tBUF", &self.bus_free_time),
            ("tVD;DAT", &self.data_valid_time),
            ("period", &self.clock_period),
        ];
        for (name, stats) in rows {
            writeln!(f, "{:<10} {}", name, stats)?;
        }
        writeln!(f, "merged     {}", self.merged_edges)?;
        write!(f, "anomalies  {}", self.anomalies)
    }
}

/// Scan state carried between transitions
#[derive(Default)]
struct ScanState {
    last_scl_rise: Option<usize>,
    last_scl_fall: Option<usize>,
    /// (calibrated, raw) tLOW of the bit in progress
    clock_low: Option<(Nanos, Nanos)>,
    sda_change: Option<usize>,
}

/// Measures I2C timing intervals in bus traces
#[derive(Debug, Clone, Copy, Default)]
pub struct I2cTimingAnalyser {
    adjuster: Adjuster,
}

impl I2cTimingAnalyser {
    /// Create an analyser calibrated for the given line edge times
    pub fn new(edges: EdgeTimes) -> Self {
        Self {
            adjuster: Adjuster::new(edges),
        }
    }

    /// Calibration applied to raw intervals
    pub fn adjuster(&self) -> &Adjuster {
        &self.adjuster
    }

    /// Analyse a completed trace
    pub fn analyse(&self, trace: &BusTrace<'_>) -> I2cTimingAnalysis {
        let mut analysis = I2cTimingAnalysis::default();
        let mut state = ScanState::default();
        let adj = &self.adjuster;

        let events = trace.events();
        let Some(first) = events.first() else {
            return analysis;
        };
        let mut prev = 0;
        let mut prev_flags = first.flags;

        for (index, event) in events.iter().enumerate().skip(1) {
            let flags = event.flags;
            if !flags.any_line_changed() {
                continue;
            }
            let elapsed = trace.nanos_between(index, prev);

            if flags.both_lines_changed() {
                log_debug!("simultaneous SDA and SCL edge at event {}", index);
                analysis.merged_edges += 1;
            }

            if flags.scl_rose() {
                if let Some(fall) = state.last_scl_fall {
                    let raw = trace.nanos_between(index, fall);
                    let low = adj.clock_low_time(raw);
                    analysis.clock_low_time.include(low);
                    state.clock_low = Some((low, raw));
                }
                if let Some(change) = state.sda_change.take() {
                    let raw = trace.nanos_between(index, change);
                    let rising = trace.event(change).is_some_and(|e| e.flags.sda());
                    analysis
                        .data_setup_time
                        .include(adj.data_setup_time(raw, rising));
                }
                state.last_scl_rise = Some(index);
            } else if flags.scl_fell() {
                let clock_low = state.clock_low.take();
                if state.last_scl_rise == Some(prev) {
                    // closes a data, ACK or NACK bit
                    let high = adj.clock_high_time(elapsed);
                    analysis.clock_high_time.include(high);
                    if let Some((low, low_raw)) = clock_low {
                        if let Some(hz) = scl_frequency(low, high) {
                            analysis.frequency.include(hz);
                        }
                        if let Some(period) = scl_period(low_raw, elapsed) {
                            analysis.clock_period.include(period);
                        }
                    }
                } else if is_start(prev_flags) {
                    analysis.start_hold_time.include(adj.start_hold_time(elapsed));
                } else {
                    log_warn!("SCL fall at event {} follows neither SCL rise nor START", index);
                    analysis.anomalies += 1;
                }
                state.last_scl_fall = Some(index);
                state.sda_change = flags.sda_changed().then_some(index);
            } else if flags.scl() {
                // SDA changed while SCL high: START or STOP
                if flags.sda_rose() {
                    analysis.stop_setup_time.include(adj.stop_setup_time(elapsed));
                } else if !prev_flags.any_line_changed() {
                    // First transition after the initial marker
                } else if prev_flags.scl_rose() {
                    analysis
                        .start_setup_time
                        .include(adj.start_setup_time(elapsed));
                } else if prev_flags.sda_rose() {
                    analysis.bus_free_time.include(adj.bus_free_time(elapsed));
                } else {
                    log_warn!("SDA fall at event {} follows another SDA fall", index);
                    analysis.anomalies += 1;
                }
            } else {
                // SDA changed while SCL low: data setup in progress. Only the
                // first change after a plain SCL fall is a hold sample.
                if prev_flags.scl_fell() && prev_flags.only_scl_changed() {
                    let rising = flags.sda();
                    let hold = adj.data_hold_time(elapsed, rising);
                    analysis.data_hold_time.include(hold);
                    analysis
                        .data_valid_time
                        .include(adj.data_valid_time(hold, rising));
                }
                state.sda_change = Some(index);
            }

            prev = index;
            prev_flags = flags;
        }

        if trace.dropped_events() > 0 {
            log_warn!(
                "trace dropped {} events, statistics are incomplete",
                trace.dropped_events()
            );
        }
        analysis
    }
}

/// SDA fell while SCL stayed high
fn is_start(flags: BusEventFlags) -> bool {
    flags.only_sda_changed() && !flags.sda() && flags.scl()
}

/// Sum of low and high durations, unless either is unknown
fn scl_period(low: Nanos, high: Nanos) -> Option<Nanos> {
    if low == UNKNOWN_NANOS || high == UNKNOWN_NANOS {
        return None;
    }
    low.checked_add(high)
}

/// SCL frequency in Hz from low and high durations
fn scl_frequency(low: Nanos, high: Nanos) -> Option<u32> {
    match scl_period(low, high) {
        Some(0) | None => None,
        Some(period) => u32::try_from(NANOS_PER_SECOND / u64::from(period)).ok(),
    }
}
