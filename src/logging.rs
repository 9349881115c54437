//! Logging abstraction
//!
//! Provides crate-internal logging macros that work across different targets:
//! - Embedded (`defmt` feature): Uses defmt
//! - Host (`log` feature, default): Uses the `log` facade
//! - Host tests without either feature: Uses println!
//! - Otherwise: No-op (arguments are still type-checked)
//!
//! Arguments must implement both `defmt::Format` and `core::fmt::Display`
//! so that the same format strings are accepted by every backend.

/// Log trace message
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)*);

        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::trace!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        println!("[TRACE] {}", format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), not(test)))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log debug message
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        println!("[DEBUG] {}", format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), not(test)))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log informational message
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        println!("[INFO] {}", format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), not(test)))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log warning message
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), feature = "log"))]
        ::log::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        println!("[WARN] {}", format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), not(test)))]
        let _ = ::core::format_args!($($arg)*);
    }};
}
