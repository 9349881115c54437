//! Captured traces compared against synthesized references

use i2c_bus_trace::{
    BusEvent, BusEventFlags, BusLine, BusTrace, BusTraceBuilder, EdgeRecorder, EdgeSink,
    I2cTimingAnalyser, MockClock, TimingStrategy, FAST_MODE,
};

fn reference() -> BusTrace<'static> {
    let mut builder = BusTraceBuilder::new(
        FAST_MODE,
        TimingStrategy::Min,
        BusTrace::max_events_required(1, false),
    );
    builder
        .bus_initially_idle()
        .start_bit()
        .address_byte(0x29, false)
        .ack()
        .data_byte(0x80)
        .ack()
        .stop_bit();
    builder.into_trace()
}

/// Replay `trace` as edge notifications into a recorder timed by `clock`.
///
/// `glitch` injects an SDA pulse of 10 ticks just after the given event.
fn replay(trace: &BusTrace<'_>, clock: &MockClock, target: &mut BusTrace<'_>, glitch: Option<usize>) {
    let first = trace.event(0).map(|e| e.flags).unwrap_or_default();
    let mut recorder = EdgeRecorder::start(target, first.sda(), first.scl());

    for (index, event) in trace.iter().enumerate().skip(1) {
        clock.advance(event.delta);
        let flags = event.flags;
        if flags.sda_changed() {
            recorder.on_edge(BusLine::Sda, flags.sda());
        }
        if flags.scl_changed() {
            recorder.on_edge(BusLine::Scl, flags.scl());
        }
        if glitch == Some(index) {
            let (sda, _) = recorder.levels();
            clock.advance(10);
            recorder.on_edge(BusLine::Sda, !sda);
            clock.advance(10);
            recorder.on_edge(BusLine::Sda, sda);
        }
    }
    recorder.finish();
}

#[test]
fn test_recorded_replay_is_identical() {
    let reference = reference();
    let clock = MockClock::new(1);
    let mut captured = BusTrace::with_clock(reference.capacity(), &clock);
    replay(&reference, &clock, &mut captured, None);

    assert_eq!(captured.compare_edges(&reference), None);
    assert_eq!(captured.compare_messages(&reference), None);
    assert_eq!(captured.is_identical_to(&reference), None);
}

#[test]
fn test_glitch_while_clock_low_is_message_equal() {
    let reference = reference();
    // event 2 is the SCL fall ending the START; SDA then glitches while SCL is low
    assert!(reference.event(2).is_some_and(|e| e.flags.scl_fell()));

    let clock = MockClock::new(1);
    let mut captured = BusTrace::with_clock(reference.capacity() + 2, &clock);
    replay(&reference, &clock, &mut captured, Some(2));

    assert_eq!(captured.len(), reference.len() + 2);
    assert_eq!(captured.compare_edges(&reference), Some(3));
    assert_eq!(captured.compare_messages(&reference), None);
    assert_eq!(reference.compare_messages(&captured), None);

    let normalized = captured.to_message(true);
    assert_eq!(normalized.compare_edges(&reference), None);

    // the glitch is excluded from the hold statistics
    let analysis = I2cTimingAnalyser::default().analyse(&captured);
    assert_eq!(analysis.anomalies, 0);
}

#[test]
fn test_merged_edge_is_message_equal() {
    let reference = reference();
    let events = reference.events();
    // first SDA change while SCL is low that is immediately followed by an SCL rise
    let split = (1..events.len() - 1)
        .find(|&i| {
            events[i].flags.only_sda_changed()
                && !events[i].flags.scl()
                && events[i + 1].flags.scl_rose()
        })
        .expect("reference contains a data bit with an SDA change");

    let mut merged = BusTrace::synthetic(reference.len());
    for (index, event) in events.iter().enumerate() {
        if index == split {
            continue;
        }
        if index == split + 1 {
            let flags = event.flags | BusEventFlags::SDA_LINE_CHANGED;
            merged.add_event(BusEvent::new(events[split].delta + event.delta, flags));
        } else {
            merged.add_event(*event);
        }
    }

    assert_eq!(merged.compare_edges(&reference), Some(split));
    assert_eq!(merged.compare_messages(&reference), None);
    assert_eq!(reference.compare_messages(&merged), None);
    assert_eq!(merged.to_message(true).compare_edges(&reference), None);
}

#[test]
fn test_wrong_bit_is_detected() {
    let reference = reference();
    let mut builder = BusTraceBuilder::new(FAST_MODE, TimingStrategy::Min, reference.capacity());
    builder
        .bus_initially_idle()
        .start_bit()
        .address_byte(0x29, false)
        .nack()
        .data_byte(0x80)
        .ack()
        .stop_bit();
    let other = builder.into_trace();

    assert!(other.compare_messages(&reference).is_some());
    assert!(other.compare_edges(&reference).is_some());
}

#[test]
fn test_capture_overflow_drops_events() {
    let reference = reference();
    let clock = MockClock::new(1);
    let mut captured = BusTrace::with_clock(10, &clock);
    replay(&reference, &clock, &mut captured, None);

    assert_eq!(captured.len(), 10);
    assert_eq!(captured.dropped_events(), reference.len() - 10);
    assert_eq!(captured.compare_edges(&reference), Some(10));
}
