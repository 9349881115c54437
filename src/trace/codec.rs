//! Binary trace persistence
//!
//! Layout:
//!
//! ```text
//! offset  size  field
//! 0       4     magic "I2CT"
//! 4       1     format version (1)
//! 5       5*N   events: delta (u32 little-endian), flags (u8)
//! ```
//!
//! The flag byte uses the [`BusEventFlags`] bit layout unchanged, so traces
//! captured on one system can be replayed and compared on another.

use alloc::vec::Vec;

use super::{BusEvent, BusEventFlags, BusTrace, TraceError};
use crate::Clock;

/// Magic number for persisted traces ("I2CT")
pub const TRACE_MAGIC: [u8; 4] = *b"I2CT";

/// Trace format version
pub const TRACE_VERSION: u8 = 1;

const HEADER_LEN: usize = 5;
const EVENT_LEN: usize = 5;

impl<'c> BusTrace<'c> {
    /// Serialize the trace events
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.len() * EVENT_LEN);
        bytes.extend_from_slice(&TRACE_MAGIC);
        bytes.push(TRACE_VERSION);
        for event in self {
            bytes.extend_from_slice(&event.delta.to_le_bytes());
            bytes.push(event.flags.bits());
        }
        bytes
    }

    /// Deserialize a trace produced by [`to_bytes`](Self::to_bytes).
    ///
    /// The resulting trace's capacity equals its event count; the tick deltas
    /// are interpreted by `clock`.
    pub fn from_bytes(bytes: &[u8], clock: Option<&'c dyn Clock>) -> Result<Self, TraceError> {
        if bytes.len() < HEADER_LEN {
            return Err(TraceError::Truncated { len: bytes.len() });
        }
        if bytes[..4] != TRACE_MAGIC {
            return Err(TraceError::BadMagic);
        }
        if bytes[4] != TRACE_VERSION {
            return Err(TraceError::UnsupportedVersion(bytes[4]));
        }

        let body = &bytes[HEADER_LEN..];
        if body.len() % EVENT_LEN != 0 {
            return Err(TraceError::Truncated { len: bytes.len() });
        }

        let events = body
            .chunks_exact(EVENT_LEN)
            .map(|record| {
                let delta = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
                BusEvent::new(delta, BusEventFlags::from_bits_retain(record[4]))
            })
            .collect();

        Ok(BusTrace::from_events(events, 0, clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::clock::SYNTHETIC_CLOCK;
    use crate::BusLine;

    #[test]
    fn test_serialized_layout() {
        let mut trace = BusTrace::synthetic(4);
        let idle = BusEventFlags::from_levels(true, true);
        trace.add_event(BusEvent::new(0, idle));
        trace.add_event(BusEvent::new(0x0001_0203, idle.with_line(BusLine::Sda, false)));

        let bytes = trace.to_bytes();
        assert_eq!(&bytes[..5], b"I2CT\x01");
        assert_eq!(&bytes[5..10], &[0, 0, 0, 0, 0b0000_0011]);
        assert_eq!(&bytes[10..15], &[0x03, 0x02, 0x01, 0x00, 0b0000_1001]);
    }

    #[test]
    fn test_decode_restores_events_and_pin_bits() {
        let mut trace = BusTrace::synthetic(4);
        trace.add_event(BusEvent::new(0, BusEventFlags::all()));
        trace.add_event(BusEvent::new(100_000, BusEventFlags::SDA_PIN_CHANGED));

        let decoded = BusTrace::from_bytes(&trace.to_bytes(), Some(&SYNTHETIC_CLOCK)).unwrap();
        assert_eq!(decoded.is_identical_to(&trace), None);
        assert_eq!(decoded.capacity(), 2);
        assert_eq!(decoded.nanos_to_previous(1), 100_000);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            BusTrace::from_bytes(b"I2C", None).unwrap_err(),
            TraceError::Truncated { len: 3 }
        );
        assert_eq!(
            BusTrace::from_bytes(b"PARA\x01", None).unwrap_err(),
            TraceError::BadMagic
        );
        assert_eq!(
            BusTrace::from_bytes(b"I2CT\x02", None).unwrap_err(),
            TraceError::UnsupportedVersion(2)
        );
        assert_eq!(
            BusTrace::from_bytes(b"I2CT\x01\x00\x00", None).unwrap_err(),
            TraceError::Truncated { len: 7 }
        );
    }

    #[test]
    fn test_empty_trace() {
        let decoded = BusTrace::from_bytes(b"I2CT\x01", None).unwrap();
        assert!(decoded.is_empty());
    }
}
