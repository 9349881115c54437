//! Bus events
//!
//! A bus event is one recorded transition: the ticks elapsed since the
//! previous event plus an 8-bit flag set describing which lines changed and
//! the levels they changed to.

use bitflags::bitflags;

use crate::{BusLine, Ticks};

bitflags! {
    /// Line and pin facts recorded with an event.
    ///
    /// The bit positions are the serialized form of a trace and must not change.
    /// All-zero means "nothing changed, both lines low".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BusEventFlags: u8 {
        /// SCL line level after this event (1 = HIGH)
        const SCL_LINE_STATE = 0b0000_0001;
        /// SDA line level after this event (1 = HIGH)
        const SDA_LINE_STATE = 0b0000_0010;
        /// SCL line level changed
        const SCL_LINE_CHANGED = 0b0000_0100;
        /// SDA line level changed
        const SDA_LINE_CHANGED = 0b0000_1000;
        /// Level the SCL pin drives (1 = released)
        const SCL_PIN_STATE = 0b0001_0000;
        /// Level the SDA pin drives (1 = released)
        const SDA_PIN_STATE = 0b0010_0000;
        /// SCL pin drive changed
        const SCL_PIN_CHANGED = 0b0100_0000;
        /// SDA pin drive changed
        const SDA_PIN_CHANGED = 0b1000_0000;

        /// Both line levels
        const LINE_STATES = Self::SCL_LINE_STATE.bits() | Self::SDA_LINE_STATE.bits();
        /// Both line change markers
        const LINE_CHANGES = Self::SCL_LINE_CHANGED.bits() | Self::SDA_LINE_CHANGED.bits();
        /// Every line-level fact
        const LINE_MASK = Self::LINE_STATES.bits() | Self::LINE_CHANGES.bits();
    }
}

impl Default for BusEventFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl BusEventFlags {
    /// Line levels with no change markers
    pub fn from_levels(sda: bool, scl: bool) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::SDA_LINE_STATE, sda);
        flags.set(Self::SCL_LINE_STATE, scl);
        flags
    }

    /// SDA line level after the event
    pub fn sda(self) -> bool {
        self.contains(Self::SDA_LINE_STATE)
    }

    /// SCL line level after the event
    pub fn scl(self) -> bool {
        self.contains(Self::SCL_LINE_STATE)
    }

    /// Whether the SDA line changed
    pub fn sda_changed(self) -> bool {
        self.contains(Self::SDA_LINE_CHANGED)
    }

    /// Whether the SCL line changed
    pub fn scl_changed(self) -> bool {
        self.contains(Self::SCL_LINE_CHANGED)
    }

    /// Whether any line changed
    pub fn any_line_changed(self) -> bool {
        self.intersects(Self::LINE_CHANGES)
    }

    /// Whether both lines changed within one sampling window
    pub fn both_lines_changed(self) -> bool {
        self.contains(Self::LINE_CHANGES)
    }

    /// SDA changed and is now high
    pub fn sda_rose(self) -> bool {
        self.sda_changed() && self.sda()
    }

    /// SDA changed and is now low
    pub fn sda_fell(self) -> bool {
        self.sda_changed() && !self.sda()
    }

    /// SCL changed and is now high
    pub fn scl_rose(self) -> bool {
        self.scl_changed() && self.scl()
    }

    /// SCL changed and is now low
    pub fn scl_fell(self) -> bool {
        self.scl_changed() && !self.scl()
    }

    /// Only the SDA line changed, SCL held its level
    pub fn only_sda_changed(self) -> bool {
        self.sda_changed() && !self.scl_changed()
    }

    /// Only the SCL line changed, SDA held its level
    pub fn only_scl_changed(self) -> bool {
        self.scl_changed() && !self.sda_changed()
    }

    /// Line-level facts only, pin facts dropped
    pub fn line_flags(self) -> Self {
        self.intersection(Self::LINE_MASK)
    }

    /// Line levels only, change markers and pin facts dropped
    pub fn levels(self) -> Self {
        self.intersection(Self::LINE_STATES)
    }

    /// Levels of `self` after `line` transitions to `level`
    pub fn with_line(self, line: BusLine, level: bool) -> Self {
        let (state, changed) = match line {
            BusLine::Sda => (Self::SDA_LINE_STATE, Self::SDA_LINE_CHANGED),
            BusLine::Scl => (Self::SCL_LINE_STATE, Self::SCL_LINE_CHANGED),
        };
        let mut flags = self.levels().union(changed);
        flags.set(state, level);
        flags
    }
}

/// One recorded bus transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusEvent {
    /// Ticks elapsed since the previous event
    pub delta: Ticks,
    /// Lines changed and resulting levels
    pub flags: BusEventFlags,
}

impl BusEvent {
    /// Create an event
    pub const fn new(delta: Ticks, flags: BusEventFlags) -> Self {
        Self { delta, flags }
    }

    /// Initial-state marker: no change, current line levels
    pub fn initial(sda: bool, scl: bool) -> Self {
        Self::new(0, BusEventFlags::from_levels(sda, scl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        assert_eq!(BusEventFlags::SCL_LINE_STATE.bits(), 1 << 0);
        assert_eq!(BusEventFlags::SDA_LINE_STATE.bits(), 1 << 1);
        assert_eq!(BusEventFlags::SCL_LINE_CHANGED.bits(), 1 << 2);
        assert_eq!(BusEventFlags::SDA_LINE_CHANGED.bits(), 1 << 3);
        assert_eq!(BusEventFlags::SCL_PIN_STATE.bits(), 1 << 4);
        assert_eq!(BusEventFlags::SDA_PIN_STATE.bits(), 1 << 5);
        assert_eq!(BusEventFlags::SCL_PIN_CHANGED.bits(), 1 << 6);
        assert_eq!(BusEventFlags::SDA_PIN_CHANGED.bits(), 1 << 7);
    }

    #[test]
    fn test_from_levels() {
        assert_eq!(BusEventFlags::from_levels(false, false).bits(), 0);
        assert_eq!(BusEventFlags::from_levels(true, true).bits(), 0b11);
        assert!(!BusEventFlags::from_levels(true, true).any_line_changed());
    }

    #[test]
    fn test_edge_predicates() {
        let idle = BusEventFlags::from_levels(true, true);

        let start = idle.with_line(BusLine::Sda, false);
        assert!(start.sda_fell());
        assert!(start.only_sda_changed());
        assert!(start.scl());

        let clock_low = start.with_line(BusLine::Scl, false);
        assert!(clock_low.scl_fell());
        assert!(!clock_low.sda_changed());
        assert!(!clock_low.sda());

        let clock_high = clock_low.with_line(BusLine::Scl, true);
        assert!(clock_high.scl_rose());
    }

    #[test]
    fn test_with_line_clears_previous_change_markers() {
        let flags = BusEventFlags::from_levels(true, true)
            .with_line(BusLine::Sda, false)
            .with_line(BusLine::Scl, false);
        assert!(!flags.sda_changed());
        assert!(flags.scl_changed());
    }

    #[test]
    fn test_line_flags_drop_pin_facts() {
        let flags = BusEventFlags::SDA_LINE_CHANGED
            | BusEventFlags::SDA_PIN_CHANGED
            | BusEventFlags::SDA_PIN_STATE;
        assert_eq!(flags.line_flags(), BusEventFlags::SDA_LINE_CHANGED);
        assert!(BusEventFlags::LINE_CHANGES.both_lines_changed());
    }
}
