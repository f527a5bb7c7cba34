use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use input_signal::prelude::*;

#[test]
fn bound_button_follows_the_source() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::Button);
    let mut button = ButtonSignal::new(clock.clone());

    button.bind(&source).unwrap();
    assert!(button.is_bound());
    assert!(source.is_bound());

    source.raise(SourceValue::Button(true)).unwrap();
    assert!(button.pressed());
    assert!(button.value());

    clock.step(0.016);
    source.raise(SourceValue::Button(false)).unwrap();
    assert!(!button.value());
    assert!(button.released());
}

#[test]
fn cancel_resets_each_signal_type_to_default() {
    let clock = FrameClock::new();

    let button_source = ActionSource::new(PayloadKind::Button);
    let mut button = ButtonSignal::new(clock.clone());
    button.bind(&button_source).unwrap();
    button_source.raise(SourceValue::Button(true)).unwrap();
    button_source.cancel();
    assert!(!button.value());

    let axis_source = ActionSource::new(PayloadKind::Axis);
    let mut axis = AxisSignal::new(clock.clone());
    axis.bind(&axis_source).unwrap();
    axis_source.raise(SourceValue::Axis(0.8)).unwrap();
    axis_source.cancel();
    assert_eq!(axis.value(), 0.0);
    assert!(axis.is_neutral());

    let pair_source = ActionSource::new(PayloadKind::DualAxis);
    let mut pair = DualAxisSignal::new(clock);
    pair.bind(&pair_source).unwrap();
    pair_source
        .raise(SourceValue::DualAxis(Vec2::new(0.3, 0.9)))
        .unwrap();
    pair_source.cancel();
    assert_eq!(pair.value(), Vec2::ZERO);
}

#[test]
fn manual_mutation_is_rejected_while_bound() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::Button);
    let mut button = ButtonSignal::new(clock.clone());

    button.bind(&source).unwrap();
    source.raise(SourceValue::Button(true)).unwrap();

    let before = button.snapshot();
    assert_eq!(button.press(), Err(MutationError::SourceBound));
    assert_eq!(button.release(), Err(MutationError::SourceBound));
    assert_eq!(button.toggle(), Err(MutationError::SourceBound));
    assert_eq!(button.snapshot(), before);

    let axis_source = ActionSource::new(PayloadKind::Axis);
    let mut axis = AxisSignal::new(clock.clone());
    axis.bind(&axis_source).unwrap();
    assert_eq!(axis.set_value(0.5), Err(MutationError::SourceBound));

    let pair_source = ActionSource::new(PayloadKind::DualAxis);
    let mut pair = DualAxisSignal::new(clock);
    pair.bind(&pair_source).unwrap();
    assert_eq!(pair.set_value(Vec2::ONE), Err(MutationError::SourceBound));
}

#[test]
fn accept_is_still_allowed_while_bound() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::Button);
    let mut button = ButtonSignal::new(clock);

    button.bind(&source).unwrap();
    source.raise(SourceValue::Button(true)).unwrap();

    assert!(button.take_pressed());
    assert!(!button.pressed());
}

#[test]
fn rebinding_fails_instead_of_replacing() {
    let clock = FrameClock::new();
    let first = ActionSource::new(PayloadKind::Button);
    let second = ActionSource::new(PayloadKind::Button);
    let mut button = ButtonSignal::new(clock);

    button.bind(&first).unwrap();
    assert_eq!(button.bind(&second), Err(BindError::AlreadyBound));

    // The original binding is intact.
    first.raise(SourceValue::Button(true)).unwrap();
    assert!(button.value());
    assert!(!second.is_bound());
}

#[test]
fn a_source_feeds_at_most_one_signal() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::Button);
    let mut first = ButtonSignal::new(clock.clone());
    let mut second = ButtonSignal::new(clock);

    first.bind(&source).unwrap();
    assert_eq!(second.bind(&source), Err(BindError::SourceOccupied));
    assert!(!second.is_bound());
}

#[test]
fn payload_shape_is_validated_at_bind_time() {
    let clock = FrameClock::new();
    let vector_source = ActionSource::new(PayloadKind::DualAxis);
    let mut axis = AxisSignal::new(clock.clone());

    assert_eq!(
        axis.bind(&vector_source),
        Err(BindError::Mismatch(PayloadMismatch {
            expected: PayloadKind::Axis,
            found: PayloadKind::DualAxis,
        }))
    );
    assert!(!axis.is_bound());
    assert!(!vector_source.is_bound());

    let mut button = ButtonSignal::new(clock);
    assert_eq!(
        button.bind(&vector_source),
        Err(BindError::Mismatch(PayloadMismatch {
            expected: PayloadKind::Button,
            found: PayloadKind::DualAxis,
        }))
    );
}

#[test]
fn unbind_restores_manual_mutation_and_frees_the_source() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::Axis);
    let mut axis = AxisSignal::new(clock.clone());

    axis.bind(&source).unwrap();
    axis.unbind();
    assert!(!axis.is_bound());
    assert!(!source.is_bound());

    axis.set_value(0.5).unwrap();
    assert!(axis.is_positive());

    // A detached source no longer reaches the signal.
    source.raise(SourceValue::Axis(-1.0)).unwrap();
    assert_eq!(axis.value(), 0.5);

    // The freed source can feed another signal.
    let mut other = AxisSignal::new(clock);
    other.bind(&source).unwrap();
    source.raise(SourceValue::Axis(-1.0)).unwrap();
    assert!(other.is_negative());
}

#[test]
fn dropping_a_bound_signal_detaches_its_subscription() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::Button);

    {
        let mut button = ButtonSignal::new(clock.clone());
        button.bind(&source).unwrap();
        assert!(source.is_bound());
    }

    assert!(!source.is_bound());
    // Raising afterwards is harmless.
    source.raise(SourceValue::Button(true)).unwrap();
}

#[test]
fn bound_pair_updates_members_and_fires_one_event() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::DualAxis);
    let mut pair = DualAxisSignal::new(clock);

    let events = Rc::new(Cell::new(0u32));
    let counter = events.clone();
    pair.on_value_changed(move |_| counter.set(counter.get() + 1));

    pair.bind(&source).unwrap();
    source
        .raise(SourceValue::DualAxis(Vec2::new(0.7, -0.2)))
        .unwrap();

    assert_eq!(events.get(), 1);
    assert!(pair.axis_x().is_positive());
    assert!(pair.axis_y().is_negative());
}

#[test]
fn mismatched_raise_is_rejected_without_delivery() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::Button);
    let mut button = ButtonSignal::new(clock);
    button.bind(&source).unwrap();

    assert_eq!(
        source.raise(SourceValue::Axis(1.0)),
        Err(PayloadMismatch {
            expected: PayloadKind::Button,
            found: PayloadKind::Axis,
        })
    );
    assert!(!button.is_initialized());
}

#[test]
fn handlers_observe_settled_state_during_delivery() {
    let clock = FrameClock::new();
    let source = ActionSource::new(PayloadKind::Button);
    let mut button = ButtonSignal::new(clock);

    let seen = Rc::new(Cell::new(false));
    let inner = seen.clone();
    button.on_value_changed(move |value| inner.set(value));

    button.bind(&source).unwrap();
    source.raise(SourceValue::Button(true)).unwrap();

    assert!(seen.get());
}
