//! I2C timing specification tables
//!
//! Parameter windows for Standard-mode (100 kHz), Fast-mode (400 kHz) and
//! Fast-mode Plus (1 MHz) buses, as defined by NXP UM10204 (I2C-bus
//! specification), table "Characteristics of the SDA and SCL bus lines".
//!
//! All durations are in nanoseconds, measured between the 30%/70% VDD
//! thresholds. Frequencies are in Hz.
//!
//! # Structure
//!
//! - [`I2cSlaveSpecification`]: windows that apply to whichever device drives
//!   SDA (data hold/setup/valid) and to the line edges
//! - [`I2cMasterSpecification`]: windows for the clock and START/STOP
//!   conditions generated by a master, plus the slave table it embeds

use core::fmt;

use crate::Nanos;

/// Inclusive `[min, max]` window for a timing parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpecRange {
    /// Smallest legal value
    pub min: u32,
    /// Largest legal value (`u32::MAX` when the specification sets no upper bound)
    pub max: u32,
}

impl SpecRange {
    /// Window bounded on both sides
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Window with only a lower bound
    pub const fn at_least(min: u32) -> Self {
        Self { min, max: u32::MAX }
    }

    /// Window with only an upper bound
    pub const fn at_most(max: u32) -> Self {
        Self { min: 0, max }
    }

    /// Whether the specification defines an upper bound
    pub const fn is_bounded(&self) -> bool {
        self.max != u32::MAX
    }

    /// Whether `value` lies within the window
    pub const fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Timing windows for the device driving the data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cSlaveSpecification {
    /// tHD;DAT: SCL fall to SDA change
    pub data_hold_time: SpecRange,
    /// tSU;DAT: SDA change to SCL rise
    pub data_setup_time: SpecRange,
    /// tVD;DAT: SCL fall to SDA valid
    pub data_valid_time: SpecRange,
    /// tr: 30% to 70% rise time of either line
    pub rise_time: SpecRange,
    /// tf: 70% to 30% fall time of either line
    pub fall_time: SpecRange,
}

/// Timing windows for the bus master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cMasterSpecification {
    /// fSCL: SCL clock frequency (Hz)
    pub frequency: SpecRange,
    /// tLOW: low period of SCL
    pub clock_low_time: SpecRange,
    /// tHIGH: high period of SCL
    pub clock_high_time: SpecRange,
    /// tHD;STA: hold time for a (repeated) START
    pub start_hold_time: SpecRange,
    /// tSU;STA: setup time for a repeated START
    pub start_setup_time: SpecRange,
    /// tSU;STO: setup time for a STOP
    pub stop_setup_time: SpecRange,
    /// tBUF: bus free time between a STOP and the next START
    pub bus_free_time: SpecRange,
    /// Windows shared with slaves when the master drives SDA
    pub slave: I2cSlaveSpecification,
}

/// Standard-mode (up to 100 kHz)
pub const STANDARD_MODE: I2cMasterSpecification = I2cMasterSpecification {
    frequency: SpecRange::at_most(100_000),
    clock_low_time: SpecRange::at_least(4_700),
    clock_high_time: SpecRange::at_least(4_000),
    start_hold_time: SpecRange::at_least(4_000),
    start_setup_time: SpecRange::at_least(4_700),
    stop_setup_time: SpecRange::at_least(4_000),
    bus_free_time: SpecRange::at_least(4_700),
    slave: I2cSlaveSpecification {
        data_hold_time: SpecRange::new(0, 3_450),
        data_setup_time: SpecRange::at_least(250),
        data_valid_time: SpecRange::at_most(3_450),
        rise_time: SpecRange::at_most(1_000),
        fall_time: SpecRange::at_most(300),
    },
};

/// Fast-mode (up to 400 kHz)
///
/// The fall time minimum is 20 ns × (VDD / 5.5 V), evaluated at VDD = 3.3 V.
pub const FAST_MODE: I2cMasterSpecification = I2cMasterSpecification {
    frequency: SpecRange::at_most(400_000),
    clock_low_time: SpecRange::at_least(1_300),
    clock_high_time: SpecRange::at_least(600),
    start_hold_time: SpecRange::at_least(600),
    start_setup_time: SpecRange::at_least(600),
    stop_setup_time: SpecRange::at_least(600),
    bus_free_time: SpecRange::at_least(1_300),
    slave: I2cSlaveSpecification {
        data_hold_time: SpecRange::new(0, 900),
        data_setup_time: SpecRange::at_least(100),
        data_valid_time: SpecRange::at_most(900),
        rise_time: SpecRange::new(20, 300),
        fall_time: SpecRange::new(12, 300),
    },
};

/// Fast-mode Plus (up to 1 MHz)
pub const FAST_MODE_PLUS: I2cMasterSpecification = I2cMasterSpecification {
    frequency: SpecRange::at_most(1_000_000),
    clock_low_time: SpecRange::at_least(500),
    clock_high_time: SpecRange::at_least(260),
    start_hold_time: SpecRange::at_least(260),
    start_setup_time: SpecRange::at_least(260),
    stop_setup_time: SpecRange::at_least(260),
    bus_free_time: SpecRange::at_least(500),
    slave: I2cSlaveSpecification {
        data_hold_time: SpecRange::new(0, 450),
        data_setup_time: SpecRange::at_least(50),
        data_valid_time: SpecRange::at_most(450),
        rise_time: SpecRange::at_most(120),
        fall_time: SpecRange::new(12, 120),
    },
};

/// I2C bus speed mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecMode {
    /// Standard-mode, up to 100 kHz
    Standard,
    /// Fast-mode, up to 400 kHz
    Fast,
    /// Fast-mode Plus, up to 1 MHz
    FastPlus,
}

impl SpecMode {
    /// All modes, slowest first
    pub const ALL: [SpecMode; 3] = [SpecMode::Standard, SpecMode::Fast, SpecMode::FastPlus];

    /// Parameter table for this mode
    pub const fn specification(&self) -> &'static I2cMasterSpecification {
        match self {
            SpecMode::Standard => &STANDARD_MODE,
            SpecMode::Fast => &FAST_MODE,
            SpecMode::FastPlus => &FAST_MODE_PLUS,
        }
    }

    /// Slowest mode whose frequency window admits `hz`
    pub fn from_frequency(hz: u32) -> Result<Self, SpecError> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.specification().frequency.contains(hz))
            .ok_or(SpecError::UnsupportedFrequency(hz))
    }

    /// Nominal clock period at the mode's maximum frequency
    pub const fn nominal_period(&self) -> Nanos {
        1_000_000_000 / self.specification().frequency.max
    }
}

impl fmt::Display for SpecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecMode::Standard => write!(f, "Standard-mode"),
            SpecMode::Fast => write!(f, "Fast-mode"),
            SpecMode::FastPlus => write!(f, "Fast-mode Plus"),
        }
    }
}

/// Errors from specification lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpecError {
    /// No bus mode supports the requested clock frequency (Hz)
    UnsupportedFrequency(u32),
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::UnsupportedFrequency(hz) => {
                write!(f, "no I2C bus mode supports {} Hz", hz)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_constructors() {
        assert_eq!(SpecRange::at_least(5), SpecRange::new(5, u32::MAX));
        assert_eq!(SpecRange::at_most(5), SpecRange::new(0, 5));
        assert!(!SpecRange::at_least(5).is_bounded());
        assert!(SpecRange::at_most(5).is_bounded());
    }

    #[test]
    fn test_range_contains() {
        let range = SpecRange::new(100, 200);
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(99));
        assert!(!range.contains(201));
    }

    #[test]
    fn test_mode_from_frequency() {
        assert_eq!(SpecMode::from_frequency(100_000), Ok(SpecMode::Standard));
        assert_eq!(SpecMode::from_frequency(10_000), Ok(SpecMode::Standard));
        assert_eq!(SpecMode::from_frequency(100_001), Ok(SpecMode::Fast));
        assert_eq!(SpecMode::from_frequency(400_000), Ok(SpecMode::Fast));
        assert_eq!(SpecMode::from_frequency(1_000_000), Ok(SpecMode::FastPlus));
        assert_eq!(
            SpecMode::from_frequency(3_400_000),
            Err(SpecError::UnsupportedFrequency(3_400_000))
        );
    }

    #[test]
    fn test_faster_modes_have_shorter_minimums() {
        let std = SpecMode::Standard.specification();
        let fast = SpecMode::Fast.specification();
        let plus = SpecMode::FastPlus.specification();

        assert!(std.clock_low_time.min > fast.clock_low_time.min);
        assert!(fast.clock_low_time.min > plus.clock_low_time.min);
        assert!(std.slave.data_setup_time.min > fast.slave.data_setup_time.min);
        assert!(fast.slave.data_setup_time.min > plus.slave.data_setup_time.min);
    }

    #[test]
    fn test_nominal_period() {
        assert_eq!(SpecMode::Standard.nominal_period(), 10_000);
        assert_eq!(SpecMode::Fast.nominal_period(), 2_500);
        assert_eq!(SpecMode::FastPlus.nominal_period(), 1_000);
    }
}
