//! Platform traits consumed by the trace engine and the bus monitor.
//!
//! This module provides the narrow contracts the core needs from the platform:
//! a monotonic tick counter and open-drain line pins with edge notification.
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Register-level platform implementations live outside this crate

pub mod clock;
pub mod pin;

pub use clock::{Clock, MockClock, SyntheticClock};
pub use pin::{BusLine, BusPin, EdgeSink, MockPin};
