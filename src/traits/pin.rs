//! Bus line pin interface
//!
//! This module defines the open-drain pin interface that platform
//! implementations must provide for each I2C line, and the edge sink that
//! receives their edge notifications.

use alloc::rc::Rc;
use core::cell::Cell;

/// One of the two I2C bus lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusLine {
    /// Serial data line
    Sda,
    /// Serial clock line
    Scl,
}

/// Open-drain bus pin interface
///
/// # Safety Invariants
///
/// - Only one owner per pin instance
/// - Edge notifications are delivered to the [`EdgeSink`] the platform glue
///   was set up with, and only while listening is enabled
pub trait BusPin {
    /// Read the electrical level of the line (`true` = HIGH).
    ///
    /// This is the line level, not the level this pin drives: any device on
    /// the bus can hold the line low.
    fn read_line(&self) -> bool;

    /// Drive the line low (`false`) or release it to float high (`true`).
    fn write_line(&mut self, release: bool);

    /// Enable or disable edge notifications for this line.
    fn listen_for_edges(&mut self, enabled: bool);
}

/// Receiver of line edge notifications.
///
/// Platform glue calls `on_edge` from its edge interrupt with the new level of
/// the line that changed.
pub trait EdgeSink {
    /// Handle a transition of `line` to `level`.
    fn on_edge(&mut self, line: BusLine, level: bool);
}

/// Mock bus pin
///
/// Clones share the same line, so a test can keep a handle while the code
/// under test owns the pin. The line is wired-AND: it reads low while the pin
/// drives it low or while the simulated external device holds it low.
#[derive(Debug, Clone)]
pub struct MockPin {
    released: Rc<Cell<bool>>,
    external_high: Rc<Cell<bool>>,
    listening: Rc<Cell<bool>>,
}

impl MockPin {
    /// Create a released pin whose line currently reads `level`
    pub fn new(level: bool) -> Self {
        Self {
            released: Rc::new(Cell::new(true)),
            external_high: Rc::new(Cell::new(level)),
            listening: Rc::new(Cell::new(false)),
        }
    }

    /// Simulate another device holding the line low (`false`) or releasing it
    pub fn set_external(&self, level: bool) {
        self.external_high.set(level);
    }

    /// Whether edge notifications are currently enabled
    pub fn is_listening(&self) -> bool {
        self.listening.get()
    }
}

impl BusPin for MockPin {
    fn read_line(&self) -> bool {
        self.released.get() && self.external_high.get()
    }

    fn write_line(&mut self, release: bool) {
        self.released.set(release);
    }

    fn listen_for_edges(&mut self, enabled: bool) {
        self.listening.set(enabled);
    }
}
