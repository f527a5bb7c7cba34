use std::cell::Cell;
use std::rc::Rc;

use assert_approx_eq::assert_approx_eq;
use glam::Vec2;
use input_signal::prelude::*;

fn signal() -> (FrameClock, DualAxisSignal) {
    let clock = FrameClock::new();
    let pair = DualAxisSignal::new(clock.clone());
    (clock, pair)
}

#[test]
fn set_value_round_trips_componentwise() {
    let (_clock, mut pair) = signal();

    let v = Vec2::new(0.6, -0.4);
    pair.set_value(v).unwrap();

    assert_eq!(pair.value(), v);
    assert_eq!(pair.axis_x().value(), v.x);
    assert_eq!(pair.axis_y().value(), v.y);
}

#[test]
fn member_axes_keep_detailed_zone_state() {
    let (clock, mut pair) = signal();

    pair.set_value(Vec2::new(0.6, -0.4)).unwrap();
    clock.step(0.016);
    pair.set_value(Vec2::new(0.2, -0.9)).unwrap();

    // Same zones on both axes, so neither timer restarted.
    assert_eq!(pair.axis_x().positive_duration_frames(), Some(1));
    assert_eq!(pair.axis_y().negative_duration_frames(), Some(1));

    pair.set_value(Vec2::new(-0.1, -0.9)).unwrap();
    assert_eq!(pair.axis_x().negative_duration_frames(), Some(0));
    assert_eq!(pair.axis_y().negative_duration_frames(), Some(1));
}

#[test]
fn exactly_one_pair_event_per_mutation() {
    let (_clock, mut pair) = signal();

    let events = Rc::new(Cell::new(0u32));
    let counter = events.clone();
    pair.on_value_changed(move |_| counter.set(counter.get() + 1));

    pair.set_value(Vec2::new(0.5, 0.5)).unwrap();
    assert_eq!(events.get(), 1);

    // Only one component changes; still exactly one unified event.
    pair.set_value(Vec2::new(0.5, -0.5)).unwrap();
    assert_eq!(events.get(), 2);

    // Bit-identical pair: nothing fires.
    pair.set_value(Vec2::new(0.5, -0.5)).unwrap();
    assert_eq!(events.get(), 2);
}

#[test]
fn neutral_requires_both_axes_neutral() {
    let (_clock, mut pair) = signal();

    assert!(!pair.is_neutral());

    pair.set_value(Vec2::new(0.0, 0.1)).unwrap();
    assert!(!pair.is_neutral());

    pair.set_value(Vec2::ZERO).unwrap();
    assert!(pair.is_neutral());
    assert!(pair.axis_x().is_neutral());
    assert!(pair.axis_y().is_neutral());
}

#[test]
fn angle_is_measured_from_up() {
    let (_clock, mut pair) = signal();

    pair.set_value(Vec2::new(0.0, 1.0)).unwrap();
    assert_approx_eq!(pair.angle(), 0.0, 1e-4);

    pair.set_value(Vec2::new(1.0, 0.0)).unwrap();
    assert_approx_eq!(pair.angle(), 90.0, 1e-3);

    pair.set_value(Vec2::new(-1.0, 0.0)).unwrap();
    assert_approx_eq!(pair.angle(), 90.0, 1e-3);

    pair.set_value(Vec2::new(0.0, -1.0)).unwrap();
    assert_approx_eq!(pair.angle(), 180.0, 1e-3);

    pair.set_value(Vec2::new(1.0, 1.0)).unwrap();
    assert_approx_eq!(pair.angle(), 45.0, 1e-3);
}

#[test]
fn angle_accepts_an_explicit_reference() {
    let (_clock, mut pair) = signal();

    pair.set_value(Vec2::new(1.0, 0.0)).unwrap();
    assert_approx_eq!(pair.angle_from(Vec2::new(1.0, 0.0)), 0.0, 1e-4);
    assert_approx_eq!(pair.angle_from(Vec2::new(0.0, 2.0)), 90.0, 1e-3);
    assert_approx_eq!(pair.angle_from(Vec2::new(-3.0, 0.0)), 180.0, 1e-3);
}

#[test]
fn degenerate_angles_resolve_to_zero() {
    let (_clock, mut pair) = signal();

    // Uninitialized pair: value is the zero vector.
    assert_eq!(pair.angle(), 0.0);

    pair.set_value(Vec2::ZERO).unwrap();
    assert_eq!(pair.angle(), 0.0);

    pair.set_value(Vec2::new(0.5, 0.5)).unwrap();
    assert_eq!(pair.angle_from(Vec2::ZERO), 0.0);
}
