//! ASCII rendering of traces for diagnostics.
//!
//! One column per event: `-` high, `_` low, `/` rising edge, `\` falling edge.
//!
//! ```text
//! SCL: --\/\/\/-
//! SDA: -\___/--/
//! ```

use core::fmt;

use super::{BusEvent, BusEventFlags, BusTrace};

fn symbol(changed: bool, high: bool) -> char {
    match (changed, high) {
        (true, true) => '/',
        (true, false) => '\\',
        (false, true) => '-',
        (false, false) => '_',
    }
}

fn scl_symbol(flags: BusEventFlags) -> char {
    symbol(flags.scl_changed(), flags.scl())
}

fn sda_symbol(flags: BusEventFlags) -> char {
    symbol(flags.sda_changed(), flags.sda())
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+{:<8} SCL {} SDA {}",
            self.delta,
            scl_symbol(self.flags),
            sda_symbol(self.flags)
        )
    }
}

impl fmt::Display for BusTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SCL: ")?;
        for event in self {
            write!(f, "{}", scl_symbol(event.flags))?;
        }
        writeln!(f)?;
        write!(f, "SDA: ")?;
        for event in self {
            write!(f, "{}", sda_symbol(event.flags))?;
        }
        Ok(())
    }
}
