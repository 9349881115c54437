//! Message normalization and trace comparison
//!
//! Two captures of the same I2C message rarely have identical edge sequences:
//! SDA may toggle while SCL is low without any protocol meaning, and two edges
//! closer together than the capture resolution are recorded as one event with
//! both change markers set. The functions here reduce a trace to its message
//! shape and compare traces at three levels of strictness.
//!
//! # Known limitation
//!
//! Splitting a merged SDA+SCL event assumes data-bit ordering: SDA changes
//! before a rising SCL edge and after a falling one. That is wrong for a
//! merged START or STOP edge pair, and it hides a transmitter that really
//! violated data-bit ordering. Capture must keep START/STOP edges separate.

use alloc::vec::Vec;

use super::{BusEvent, BusEventFlags, BusTrace};
use crate::Ticks;

impl<'c> BusTrace<'c> {
    /// Reduce the trace to its message shape.
    ///
    /// The result keeps line-level facts only (pin facts and pin-only events
    /// are dropped), collapses SDA toggles while SCL is low to at most the one
    /// change that sets the level SCL will sample, and, with `split_events`,
    /// splits merged SDA+SCL events in data-bit order. Dropped events hand
    /// their deltas on to the next kept event, so total duration is preserved
    /// up to the last kept event.
    pub fn to_message(&self, split_events: bool) -> BusTrace<'c> {
        let mut lines: Vec<BusEvent> = Vec::with_capacity(self.len() + self.len() / 2);
        let mut carry: Ticks = 0;

        for (index, event) in self.iter().enumerate() {
            let flags = event.flags.line_flags();
            let delta = event.delta.saturating_add(carry);

            if index > 0 && !flags.any_line_changed() {
                carry = delta;
                continue;
            }
            carry = 0;

            if split_events && flags.both_lines_changed() {
                let (first, second) = split_merged(flags);
                lines.push(BusEvent::new(delta, first));
                lines.push(BusEvent::new(0, second));
            } else {
                lines.push(BusEvent::new(delta, flags));
            }
        }

        let events = collapse_low_clock_toggles(&lines);
        BusTrace::from_events(events, self.capacity(), self.clock())
    }

    /// Compare the line-level edge sequences of two traces.
    ///
    /// Timing and pin facts are ignored. Returns the index of the first
    /// mismatching event (the shorter length when one trace is a prefix of
    /// the other), or `None` when both sequences are equal.
    pub fn compare_edges(&self, other: &BusTrace<'_>) -> Option<usize> {
        let len = self.len().max(other.len());
        (0..len).find(|&index| {
            let ours = self.event(index).map(|e| e.flags.line_flags());
            let theirs = other.event(index).map(|e| e.flags.line_flags());
            ours != theirs
        })
    }

    /// Compare the messages two traces carry.
    ///
    /// Tolerates SDA toggles while SCL is low, and merged simultaneous edges:
    /// a merged event in one trace matches two adjacent single-line events in
    /// the other when together they make the same transition, whichever line
    /// changed first. Returns `None` when the messages match, otherwise the
    /// index of the first mismatch in `self.to_message(false)`.
    pub fn compare_messages(&self, other: &BusTrace<'_>) -> Option<usize> {
        let ours = self.to_message(false);
        let theirs = other.to_message(false);
        let (a, b) = (ours.events(), theirs.events());

        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let (fa, fb) = (a[i].flags, b[j].flags);
            if fa == fb {
                i += 1;
                j += 1;
            } else if fa.both_lines_changed() && merges_into(b.get(j..j + 2), fa) {
                i += 1;
                j += 2;
            } else if fb.both_lines_changed() && merges_into(a.get(i..i + 2), fb) {
                i += 2;
                j += 1;
            } else {
                return Some(i);
            }
        }

        if i == a.len() && j == b.len() {
            None
        } else {
            Some(i)
        }
    }

    /// Compare every event including timing and pin facts.
    ///
    /// Returns the index of the first differing event, or `None` when the
    /// traces are identical.
    pub fn is_identical_to(&self, other: &BusTrace<'_>) -> Option<usize> {
        let len = self.len().max(other.len());
        (0..len).find(|&index| self.event(index) != other.event(index))
    }
}

/// Split a merged SDA+SCL event into two single-line events.
///
/// SDA goes first on a rising SCL edge and second on a falling one.
fn split_merged(flags: BusEventFlags) -> (BusEventFlags, BusEventFlags) {
    let before = BusEventFlags::from_levels(!flags.sda(), !flags.scl());
    if flags.scl() {
        let first = before.with_line(crate::BusLine::Sda, flags.sda());
        let second = first.with_line(crate::BusLine::Scl, true);
        (first, second)
    } else {
        let first = before.with_line(crate::BusLine::Scl, false);
        let second = first.with_line(crate::BusLine::Sda, flags.sda());
        (first, second)
    }
}

/// Whether two single-line events together make the transition of `merged`
fn merges_into(pair: Option<&[BusEvent]>, merged: BusEventFlags) -> bool {
    let Some([first, second]) = pair else {
        return false;
    };
    let (first, second) = (first.flags, second.flags);

    let single_lines = first.any_line_changed()
        && !first.both_lines_changed()
        && second.any_line_changed()
        && !second.both_lines_changed();
    let covers_both = (first | second).contains(BusEventFlags::LINE_CHANGES);
    // The first sub-edge must already show the final level of its own line
    let first_consistent = if first.sda_changed() {
        first.sda() == merged.sda()
    } else {
        first.scl() == merged.scl()
    };

    single_lines && covers_both && first_consistent && second.levels() == merged.levels()
}

/// Keep at most one SDA change per SCL-low window: the last one, and only
/// when it leaves SDA at a different level than the window started with.
fn collapse_low_clock_toggles(events: &[BusEvent]) -> Vec<BusEvent> {
    let mut out = Vec::with_capacity(events.len());
    let mut window: Option<LowClockWindow> = None;
    let mut carry: Ticks = 0;

    for event in events {
        let flags = event.flags;
        if flags.only_sda_changed() && !flags.scl() {
            let delta = event.delta.saturating_add(carry);
            carry = 0;
            match window.as_mut() {
                Some(open) => {
                    open.delta = open.delta.saturating_add(delta);
                    open.last = flags;
                }
                None => {
                    window = Some(LowClockWindow {
                        start_sda: !flags.sda(),
                        delta,
                        last: flags,
                    })
                }
            }
            continue;
        }

        if let Some(closed) = window.take() {
            carry = closed.flush(&mut out);
        }
        out.push(BusEvent::new(event.delta.saturating_add(carry), flags));
        carry = 0;
    }

    if let Some(closed) = window.take() {
        closed.flush(&mut out);
    }
    out
}

/// SDA changes seen since SCL went low
struct LowClockWindow {
    start_sda: bool,
    delta: Ticks,
    last: BusEventFlags,
}

impl LowClockWindow {
    /// Emit the surviving change, or return the ticks to carry forward
    fn flush(self, out: &mut Vec<BusEvent>) -> Ticks {
        if self.last.sda() != self.start_sda {
            out.push(BusEvent::new(self.delta, self.last));
            0
        } else {
            self.delta
        }
    }
}
