//! Trace error types
//!
//! Provides error types for decoding persisted traces.

use core::fmt;

/// Errors from decoding a persisted trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TraceError {
    /// Input ends inside the header or inside an event record
    Truncated {
        /// Length of the input in bytes
        len: usize,
    },
    /// Input does not start with the trace magic
    BadMagic,
    /// Format version is not understood by this decoder
    UnsupportedVersion(u8),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::Truncated { len } => write!(f, "trace truncated at {} bytes", len),
            TraceError::BadMagic => write!(f, "not a bus trace"),
            TraceError::UnsupportedVersion(version) => {
                write!(f, "unsupported trace format version {}", version)
            }
        }
    }
}
