#![cfg_attr(not(test), no_std)]

//! i2c_bus_trace - Electrical-level I2C bus trace analysis
//!
//! This crate records raw transitions on the two open-drain I2C lines (SDA, SCL),
//! reconstructs the protocol events they encode and measures the characteristic
//! timing intervals against the Standard, Fast and Fast-mode Plus windows.
//!
//! # Design Principles
//!
//! - **no_std + alloc**: Runs on the capture target as well as on the host
//! - **Trait abstractions**: Clock and pin services injected via traits
//! - **No panics**: Invalid queries yield sentinels, malformed traces are logged
//!
//! # Modules
//!
//! - [`traits`]: Platform-agnostic clock and pin abstractions (with mocks)
//! - [`statistics`]: Streaming min/max/average aggregation
//! - [`specification`]: I2C timing parameter tables per bus mode
//! - [`trace`]: Bus events, capped event log, message normalization and comparison
//! - [`builder`]: Synthesizes reference traces from protocol operations
//! - [`analysis`]: Timing analyser and trigger-threshold calibration
//! - [`capture`]: Edge-to-event recorder populating a trace
//! - [`monitor`]: Live idle/busy/stuck bus state machine

extern crate alloc;

#[macro_use]
mod logging;

pub mod analysis;
pub mod builder;
pub mod capture;
pub mod monitor;
pub mod specification;
pub mod statistics;
pub mod trace;
pub mod traits;

pub use analysis::{Adjuster, EdgeTimes, I2cTimingAnalyser, I2cTimingAnalysis};
pub use builder::{BusTraceBuilder, TimingStrategy};
pub use capture::{EdgeRecorder, SharedEdgeSink};
pub use monitor::{BusMonitor, BusMonitorConfig, BusState, MonitorError};
pub use specification::{
    I2cMasterSpecification, I2cSlaveSpecification, SpecError, SpecMode, SpecRange, FAST_MODE,
    FAST_MODE_PLUS, STANDARD_MODE,
};
pub use statistics::DurationStatistics;
pub use trace::{BusEvent, BusEventFlags, BusTrace, TraceError};
pub use traits::{BusLine, BusPin, Clock, EdgeSink, MockClock, MockPin, SyntheticClock};

/// Hardware clock ticks
pub type Ticks = u32;

/// Duration in nanoseconds
pub type Nanos = u32;

/// Sentinel returned when a duration cannot be measured
///
/// Statistics accept it as a legitimate (if extreme) sample.
pub const UNKNOWN_NANOS: Nanos = Nanos::MAX;
