//! Trigger-threshold calibration
//!
//! Capture engines timestamp an edge when the line crosses its half-supply
//! trigger threshold (50% VDD). The I2C specification measures intervals at
//! the 30% and 70% thresholds instead, and defines rise/fall times between
//! those same thresholds. Assuming linear edges, the 50% trigger therefore
//! lies exactly half an edge time away from either specification threshold.
//!
//! Every interval is bounded by two edges. Depending on which threshold the
//! specification uses at each end, the trigger-to-trigger time overstates the
//! interval by half of each bounding edge time:
//!
//! | Interval | Starts at | Ends at |
//! |---|---|---|
//! | tHD;STA start hold | SDA fall (30%) | SCL fall (70%) |
//! | tSU;STA start setup | SCL rise (70%) | SDA fall (70%) |
//! | tSU;STO stop setup | SCL rise (70%) | SDA rise (30%) |
//! | tLOW clock low | SCL fall (30%) | SCL rise (30%) |
//! | tHIGH clock high | SCL rise (70%) | SCL fall (70%) |
//! | tBUF bus free | SDA rise (70%) | SDA fall (70%) |
//! | tSU;DAT data setup | SDA rise (70%) / fall (30%) | SCL rise (30%) |
//! | tHD;DAT data hold | SCL fall (30%) | SDA fall (70%) / rise (30%) |

use crate::specification::I2cSlaveSpecification;
use crate::{Nanos, UNKNOWN_NANOS};

/// Measured 30%→70% transition times of both lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeTimes {
    /// SDA rise time (ns)
    pub sda_rise: Nanos,
    /// SDA fall time (ns)
    pub sda_fall: Nanos,
    /// SCL rise time (ns)
    pub scl_rise: Nanos,
    /// SCL fall time (ns)
    pub scl_fall: Nanos,
}

impl EdgeTimes {
    /// Ideal edges: trigger and specification thresholds coincide
    pub const IDEAL: EdgeTimes = EdgeTimes {
        sda_rise: 0,
        sda_fall: 0,
        scl_rise: 0,
        scl_fall: 0,
    };

    /// Same rise and fall times on both lines
    pub const fn symmetric(rise: Nanos, fall: Nanos) -> Self {
        Self {
            sda_rise: rise,
            sda_fall: fall,
            scl_rise: rise,
            scl_fall: fall,
        }
    }

    /// Slowest edges a slave specification allows
    ///
    /// Bounded ranges only; an unbounded maximum yields an ideal edge.
    pub const fn slowest(slave: &I2cSlaveSpecification) -> Self {
        let rise = if slave.rise_time.is_bounded() {
            slave.rise_time.max
        } else {
            0
        };
        let fall = if slave.fall_time.is_bounded() {
            slave.fall_time.max
        } else {
            0
        };
        Self::symmetric(rise, fall)
    }
}

/// Edge whose trigger point bounds an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// SDA rising
    SdaRise,
    /// SDA falling
    SdaFall,
    /// SCL rising
    SclRise,
    /// SCL falling
    SclFall,
}

impl Edge {
    /// SDA edge in the given direction
    pub const fn sda(rising: bool) -> Self {
        if rising {
            Edge::SdaRise
        } else {
            Edge::SdaFall
        }
    }
}

/// Converts trigger-to-trigger intervals to specification intervals.
///
/// The [`UNKNOWN_NANOS`] sentinel passes through unchanged; results saturate
/// at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjuster {
    edges: EdgeTimes,
}

impl Adjuster {
    /// Create an adjuster for the given line edge times
    pub const fn new(edges: EdgeTimes) -> Self {
        Self { edges }
    }

    /// Line edge times this adjuster compensates for
    pub const fn edge_times(&self) -> EdgeTimes {
        self.edges
    }

    /// Distance between an edge's trigger point and its specification threshold
    pub const fn trigger_offset(&self, edge: Edge) -> Nanos {
        let time = match edge {
            Edge::SdaRise => self.edges.sda_rise,
            Edge::SdaFall => self.edges.sda_fall,
            Edge::SclRise => self.edges.scl_rise,
            Edge::SclFall => self.edges.scl_fall,
        };
        time / 2
    }

    /// Specification interval from a trigger-to-trigger interval between `from` and `to`
    pub fn adjust(&self, raw: Nanos, from: Edge, to: Edge) -> Nanos {
        if raw == UNKNOWN_NANOS {
            return raw;
        }
        raw.saturating_sub(self.trigger_offset(from))
            .saturating_sub(self.trigger_offset(to))
    }

    /// Trigger-to-trigger interval that measures as `interval` between `from` and `to`
    pub fn unadjust(&self, interval: Nanos, from: Edge, to: Edge) -> Nanos {
        if interval == UNKNOWN_NANOS {
            return interval;
        }
        interval
            .saturating_add(self.trigger_offset(from))
            .saturating_add(self.trigger_offset(to))
    }

    /// tHD;STA
    pub fn start_hold_time(&self, raw: Nanos) -> Nanos {
        self.adjust(raw, Edge::SdaFall, Edge::SclFall)
    }

    /// tSU;STA
    pub fn start_setup_time(&self, raw: Nanos) -> Nanos {
        self.adjust(raw, Edge::SclRise, Edge::SdaFall)
    }

    /// tSU;STO
    pub fn stop_setup_time(&self, raw: Nanos) -> Nanos {
        self.adjust(raw, Edge::SclRise, Edge::SdaRise)
    }

    /// tLOW
    pub fn clock_low_time(&self, raw: Nanos) -> Nanos {
        self.adjust(raw, Edge::SclFall, Edge::SclRise)
    }

    /// tHIGH
    pub fn clock_high_time(&self, raw: Nanos) -> Nanos {
        self.adjust(raw, Edge::SclRise, Edge::SclFall)
    }

    /// tBUF
    pub fn bus_free_time(&self, raw: Nanos) -> Nanos {
        self.adjust(raw, Edge::SdaRise, Edge::SdaFall)
    }

    /// tSU;DAT for an SDA edge in the given direction
    pub fn data_setup_time(&self, raw: Nanos, sda_rising: bool) -> Nanos {
        self.adjust(raw, Edge::sda(sda_rising), Edge::SclRise)
    }

    /// tHD;DAT for an SDA edge in the given direction
    pub fn data_hold_time(&self, raw: Nanos, sda_rising: bool) -> Nanos {
        self.adjust(raw, Edge::SclFall, Edge::sda(sda_rising))
    }

    /// tVD;DAT from an adjusted hold time: SDA still has to complete its edge
    pub fn data_valid_time(&self, hold: Nanos, sda_rising: bool) -> Nanos {
        if hold == UNKNOWN_NANOS {
            return hold;
        }
        let edge = if sda_rising {
            self.edges.sda_rise
        } else {
            self.edges.sda_fall
        };
        hold.saturating_add(edge)
    }
}
