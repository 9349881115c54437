//! Bus state monitor
//!
//! Tracks whether the bus is idle, busy or stuck from edge activity on SDA and
//! SCL, independently of any trace.
//!
//! # State machine
//!
//! ```text
//!            begin()                      edge
//! Unknown ───────────► Idle ◄────────► Busy ──────────► Stuck
//!    ▲     (both high)        busy timeout      line low past
//!    │                        with both high    stuck timeout
//!    └── end() from any state          ▲                  │
//!                                      └──────────────────┘
//!                                       edge with both lines high
//! ```
//!
//! Timeouts are evaluated lazily in [`BusMonitor::state`]; there is no
//! background timer. Elapsed time is measured with wraparound-safe tick
//! arithmetic from the last edge (or from [`BusMonitor::begin`]).

use core::fmt;

use crate::{BusLine, BusPin, Clock, EdgeSink, Nanos, Ticks};

/// Default busy timeout: 1 ms without edges with both lines high
pub const DEFAULT_BUSY_TIMEOUT_NS: Nanos = 1_000_000;

/// Default stuck timeout: SMBus tTIMEOUT minimum of 25 ms
pub const DEFAULT_STUCK_TIMEOUT_NS: Nanos = 25_000_000;

/// Bus state as seen by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// Monitor not running
    Unknown,
    /// Both lines high and no recent activity
    Idle,
    /// Recent edge activity or a line held low
    Busy,
    /// A line held low past the stuck timeout
    Stuck,
}

impl fmt::Display for BusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BusState::Unknown => "unknown",
            BusState::Idle => "idle",
            BusState::Busy => "busy",
            BusState::Stuck => "stuck",
        };
        f.write_str(name)
    }
}

/// Monitor timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusMonitorConfig {
    /// Quiet time after which a busy bus with both lines high is idle (ns)
    pub busy_timeout_ns: Nanos,
    /// Time a line may be held low before the bus is stuck (ns)
    pub stuck_timeout_ns: Nanos,
}

impl Default for BusMonitorConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ns: DEFAULT_BUSY_TIMEOUT_NS,
            stuck_timeout_ns: DEFAULT_STUCK_TIMEOUT_NS,
        }
    }
}

impl BusMonitorConfig {
    /// Check that the stuck timeout is longer than the busy timeout
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.busy_timeout_ns >= self.stuck_timeout_ns {
            return Err(MonitorError::InvalidTimeouts {
                busy_ns: self.busy_timeout_ns,
                stuck_ns: self.stuck_timeout_ns,
            });
        }
        Ok(())
    }
}

/// Monitor configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorError {
    /// Stuck timeout not longer than busy timeout
    InvalidTimeouts {
        /// Configured busy timeout (ns)
        busy_ns: Nanos,
        /// Configured stuck timeout (ns)
        stuck_ns: Nanos,
    },
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::InvalidTimeouts { busy_ns, stuck_ns } => write!(
                f,
                "stuck timeout {} ns must exceed busy timeout {} ns",
                stuck_ns, busy_ns
            ),
        }
    }
}

/// Idle/busy/stuck monitor for one I2C bus
///
/// Platform glue forwards SDA and SCL edge interrupts to the monitor through
/// [`EdgeSink`] while it is running. Dropping the monitor stops it.
pub struct BusMonitor<P: BusPin, C: Clock> {
    sda: P,
    scl: P,
    clock: C,
    config: BusMonitorConfig,
    state: BusState,
    last_reset: Ticks,
}

impl<P: BusPin, C: Clock> BusMonitor<P, C> {
    /// Create a stopped monitor
    pub fn new(sda: P, scl: P, clock: C, config: BusMonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self {
            sda,
            scl,
            clock,
            config,
            state: BusState::Unknown,
            last_reset: 0,
        })
    }

    /// Configured timeouts
    pub fn config(&self) -> &BusMonitorConfig {
        &self.config
    }

    /// Whether the monitor is running
    pub fn is_running(&self) -> bool {
        self.state != BusState::Unknown
    }

    /// Start monitoring; a no-op while running
    pub fn begin(&mut self) {
        if self.is_running() {
            return;
        }
        self.state = if self.lines_high() {
            BusState::Idle
        } else {
            BusState::Busy
        };
        self.last_reset = self.clock.now();
        self.sda.listen_for_edges(true);
        self.scl.listen_for_edges(true);
        log_info!("bus monitor started");
    }

    /// Stop monitoring; a no-op while stopped
    pub fn end(&mut self) {
        if !self.is_running() {
            return;
        }
        self.sda.listen_for_edges(false);
        self.scl.listen_for_edges(false);
        self.state = BusState::Unknown;
        log_info!("bus monitor stopped");
    }

    /// Current bus state, applying any timeout that has elapsed
    pub fn state(&mut self) -> BusState {
        if self.state == BusState::Busy {
            let elapsed = self.elapsed_ns();
            if self.lines_high() {
                if elapsed > self.config.busy_timeout_ns {
                    self.transition(BusState::Idle);
                }
            } else if elapsed > self.config.stuck_timeout_ns {
                log_warn!("bus stuck: line low for {} ns", elapsed);
                self.transition(BusState::Stuck);
            }
        }
        self.state
    }

    /// Nanoseconds since the last edge or since [`begin`](Self::begin)
    pub fn elapsed_ns(&self) -> Nanos {
        self.clock.nanos_since(self.last_reset)
    }

    fn lines_high(&self) -> bool {
        self.sda.read_line() && self.scl.read_line()
    }

    fn transition(&mut self, state: BusState) {
        if self.state != state {
            log_debug!("bus state {} -> {}", self.state, state);
            self.state = state;
        }
    }
}

impl<P: BusPin, C: Clock> EdgeSink for BusMonitor<P, C> {
    fn on_edge(&mut self, _line: BusLine, _level: bool) {
        if !self.is_running() {
            return;
        }
        self.last_reset = self.clock.now();
        if self.state != BusState::Stuck || self.lines_high() {
            self.transition(BusState::Busy);
        }
    }
}

impl<P: BusPin, C: Clock> Drop for BusMonitor<P, C> {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockClock, MockPin};

    const MS: Nanos = 1_000_000;

    fn monitor<'a>(
        clock: &'a MockClock,
        sda: &MockPin,
        scl: &MockPin,
    ) -> BusMonitor<MockPin, &'a MockClock> {
        BusMonitor::new(sda.clone(), scl.clone(), clock, BusMonitorConfig::default()).unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(BusMonitorConfig::default().validate().is_ok());
        let config = BusMonitorConfig {
            busy_timeout_ns: 5 * MS,
            stuck_timeout_ns: 5 * MS,
        };
        assert_eq!(
            config.validate(),
            Err(MonitorError::InvalidTimeouts {
                busy_ns: 5 * MS,
                stuck_ns: 5 * MS
            })
        );

        let clock = MockClock::new(1);
        let result = BusMonitor::new(MockPin::new(true), MockPin::new(true), &clock, config);
        assert!(result.is_err());
    }

    #[test]
    fn test_begin_samples_lines() {
        let clock = MockClock::new(1);
        let (sda, scl) = (MockPin::new(true), MockPin::new(true));
        let mut mon = monitor(&clock, &sda, &scl);
        assert_eq!(mon.state(), BusState::Unknown);

        mon.begin();
        assert_eq!(mon.state(), BusState::Idle);
        assert!(sda.is_listening() && scl.is_listening());

        let low = MockPin::new(false);
        let mut mon = monitor(&clock, &low, &scl);
        mon.begin();
        assert_eq!(mon.state(), BusState::Busy);
    }

    #[test]
    fn test_begin_and_end_are_idempotent() {
        let clock = MockClock::new(1);
        let (sda, scl) = (MockPin::new(true), MockPin::new(true));
        let mut mon = monitor(&clock, &sda, &scl);

        mon.end();
        assert_eq!(mon.state(), BusState::Unknown);

        mon.begin();
        clock.advance_nanos(MS / 2);
        sda.set_external(false);
        mon.begin();
        // second begin neither resamples nor resets the timer
        assert_eq!(mon.state(), BusState::Idle);
        assert_eq!(mon.elapsed_ns(), MS / 2);

        mon.end();
        mon.end();
        assert_eq!(mon.state(), BusState::Unknown);
        assert!(!sda.is_listening());
    }

    #[test]
    fn test_edge_while_stopped_is_ignored() {
        let clock = MockClock::new(1);
        let (sda, scl) = (MockPin::new(true), MockPin::new(true));
        let mut mon = monitor(&clock, &sda, &scl);
        mon.on_edge(BusLine::Sda, false);
        assert_eq!(mon.state(), BusState::Unknown);
    }

    #[test]
    fn test_stuck_recovers_on_edge_with_lines_high() {
        let clock = MockClock::new(1);
        let (sda, scl) = (MockPin::new(true), MockPin::new(true));
        let mut mon = monitor(&clock, &sda, &scl);
        mon.begin();

        scl.set_external(false);
        mon.on_edge(BusLine::Scl, false);
        clock.advance_nanos(26 * MS);
        assert_eq!(mon.state(), BusState::Stuck);

        // SDA toggles while SCL is still held low
        sda.set_external(false);
        mon.on_edge(BusLine::Sda, false);
        sda.set_external(true);
        mon.on_edge(BusLine::Sda, true);
        assert_eq!(mon.state(), BusState::Stuck);

        scl.set_external(true);
        mon.on_edge(BusLine::Scl, true);
        assert_eq!(mon.state(), BusState::Busy);
        assert_eq!(mon.elapsed_ns(), 0);
    }

    #[test]
    fn test_drop_stops_listening() {
        let clock = MockClock::new(1);
        let (sda, scl) = (MockPin::new(true), MockPin::new(true));
        {
            let mut mon = monitor(&clock, &sda, &scl);
            mon.begin();
            assert!(scl.is_listening());
        }
        assert!(!sda.is_listening());
        assert!(!scl.is_listening());
    }

    #[test]
    fn test_elapsed_wraps_with_counter() {
        let clock = MockClock::with_initial(1, u32::MAX - 10);
        let (sda, scl) = (MockPin::new(true), MockPin::new(true));
        let mut mon = monitor(&clock, &sda, &scl);
        mon.begin();
        clock.advance(30);
        assert_eq!(mon.elapsed_ns(), 30);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", BusState::Stuck), "stuck");
    }
}
