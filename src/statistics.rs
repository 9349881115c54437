//! Duration statistics
//!
//! Streaming min/max/count/average aggregation of measured intervals, with a
//! compliance check against a specification window.

use core::fmt;

use crate::specification::SpecRange;

/// Running statistics over unsigned interval samples.
///
/// The sum is accumulated as `f64` so that many large samples (including the
/// [`UNKNOWN_NANOS`](crate::UNKNOWN_NANOS) sentinel) cannot overflow it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DurationStatistics {
    count: u32,
    min: u32,
    max: u32,
    sum: f64,
}

impl Default for DurationStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationStatistics {
    /// Create empty statistics
    pub const fn new() -> Self {
        Self {
            count: 0,
            min: u32::MAX,
            max: 0,
            sum: 0.0,
        }
    }

    /// Add a sample
    pub fn include(&mut self, value: u32) {
        self.count = self.count.saturating_add(1);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += f64::from(value);
    }

    /// Number of samples included
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Smallest sample (`u32::MAX` while empty)
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Largest sample (0 while empty)
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Whether no sample has been included yet
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean of all samples, rounded to the nearest integer (ties away from zero).
    ///
    /// Returns 0 when empty.
    pub fn average(&self) -> u32 {
        if self.count == 0 {
            return 0;
        }
        libm::round(self.sum / f64::from(self.count)) as u32
    }

    /// Check that every sample lies within `range`
    ///
    /// Vacuously true while empty.
    pub fn meets_specification(&self, range: SpecRange) -> bool {
        range.min <= self.min && self.max <= range.max
    }

    /// Reset to the empty state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl fmt::Display for DurationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "n=0");
        }
        write!(
            f,
            "n={} min={} avg={} max={}",
            self.count,
            self.min,
            self.average(),
            self.max
        )
    }
}
