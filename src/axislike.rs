//! Continuous (directional axis) signals classified into sign zones.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::errors::{check_threshold, BindError, MutationError, NegativeThreshold, PayloadMismatch};
use crate::event_source::{ActionSource, PayloadKind, SourceValue, Subscription};
use crate::frame_clock::{FrameClock, FrameStamp};

/// The sign classification of a continuous value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Zone {
    /// The value is strictly below zero.
    Negative,
    /// The value is exactly zero.
    #[default]
    Neutral,
    /// The value is strictly above zero.
    Positive,
}

impl Zone {
    /// Classifies a raw value by sign.
    ///
    /// `NaN` classifies as [`Neutral`](Zone::Neutral): both sign comparisons
    /// fail on it.
    #[inline]
    #[must_use]
    pub fn of(value: f32) -> Self {
        if value > 0.0 {
            Zone::Positive
        } else if value < 0.0 {
            Zone::Negative
        } else {
            Zone::Neutral
        }
    }
}

/// A copyable view of an axis's raw state, for inspection or recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSnapshot {
    /// The raw value.
    pub value: f32,
    /// The zone the value currently classifies into, or `None` before the
    /// first set.
    pub zone: Option<Zone>,
    /// When the current zone was entered, or `None` before the first set.
    pub zone_stamp: Option<FrameStamp>,
}

#[derive(Debug, Default)]
struct AxisCore {
    value: f32,
    zone: Zone,
    zone_stamp: Option<FrameStamp>,
}

impl AxisCore {
    fn initialized(&self) -> bool {
        self.zone_stamp.is_some()
    }

    /// The entry stamp of `zone`, if it is the current zone.
    fn zone_entry(&self, zone: Zone) -> Option<FrameStamp> {
        let stamp = self.zone_stamp?;
        (self.zone == zone).then_some(stamp)
    }
}

#[derive(Default)]
struct AxisHandlers {
    positive: Vec<Box<dyn FnMut(f32)>>,
    neutral: Vec<Box<dyn FnMut(f32)>>,
    negative: Vec<Box<dyn FnMut(f32)>>,
    value_changed: Vec<Box<dyn FnMut(f32)>>,
}

pub(crate) struct AxisInner {
    clock: FrameClock,
    core: RefCell<AxisCore>,
    handlers: RefCell<AxisHandlers>,
    source: RefCell<Option<ActionSource>>,
}

impl AxisInner {
    /// Applies an observed value.
    ///
    /// Zone entry stamps update iff the classified zone changes (or this is
    /// the first observation); re-setting within the same zone never restamps.
    /// A bit-identical value on an initialized axis does nothing at all.
    /// With `notify` false (the paired-signal path) no handlers fire, but the
    /// state and stamps update the same way.
    pub(crate) fn apply(&self, value: f32, notify: bool) {
        let stamp = self.clock.stamp();
        let zone = Zone::of(value);
        let zone_changed;
        {
            let mut core = self.core.borrow_mut();
            if core.initialized() && core.value.to_bits() == value.to_bits() {
                return;
            }

            zone_changed = !core.initialized() || zone != core.zone;
            core.value = value;
            if zone_changed {
                core.zone = zone;
                core.zone_stamp = Some(stamp);
                trace!("axis entered {:?} zone at frame {}", zone, stamp.frame);
            }
        }

        if !notify {
            return;
        }

        let mut handlers = self.handlers.borrow_mut();
        if zone_changed {
            let zone_handlers = match zone {
                Zone::Positive => &mut handlers.positive,
                Zone::Neutral => &mut handlers.neutral,
                Zone::Negative => &mut handlers.negative,
            };
            for handler in zone_handlers.iter_mut() {
                handler(value);
            }
        }
        for handler in handlers.value_changed.iter_mut() {
            handler(value);
        }
    }

    pub(crate) fn value(&self) -> f32 {
        self.core.borrow().value
    }

    pub(crate) fn zone(&self) -> Option<Zone> {
        let core = self.core.borrow();
        core.initialized().then_some(core.zone)
    }
}

/// A continuous signal that tracks which sign [`Zone`] its value occupies and
/// for how long.
///
/// Unlike [`ButtonSignal`](crate::buttonlike::ButtonSignal) there is no
/// accept/buffer mechanism: "is the stick tilted" is a level query, not an
/// edge, so every query reads the live state. Only the *current* zone's entry
/// time is retained.
///
/// Until the first [`set_value`](Self::set_value) the signal is
/// uninitialized: zone predicates return `false` and durations return `None`.
///
/// # Example
/// ```rust
/// use input_signal::prelude::*;
///
/// let clock = FrameClock::new();
/// let mut throttle = AxisSignal::new(clock.clone());
///
/// throttle.set_value(0.5).unwrap();
/// clock.step(1.0 / 60.0);
/// throttle.set_value(0.3).unwrap();
///
/// // Same zone, so the entry stamp is untouched.
/// assert_eq!(throttle.positive_duration_frames(), Some(1));
///
/// throttle.set_value(-0.2).unwrap();
/// assert!(throttle.is_negative());
/// assert_eq!(throttle.negative_duration_frames(), Some(0));
/// ```
pub struct AxisSignal {
    inner: Rc<AxisInner>,
}

impl AxisSignal {
    /// Creates a neutral, uninitialized axis reading from `clock`.
    #[must_use]
    pub fn new(clock: FrameClock) -> Self {
        Self {
            inner: Rc::new(AxisInner {
                clock,
                core: RefCell::default(),
                handlers: RefCell::default(),
                source: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn inner(&self) -> &Rc<AxisInner> {
        &self.inner
    }

    /// The raw value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> f32 {
        self.inner.value()
    }

    /// The zone the value currently classifies into, or `None` before the
    /// first set.
    #[inline]
    #[must_use]
    pub fn zone(&self) -> Option<Zone> {
        self.inner.zone()
    }

    /// Whether at least one value has been observed.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.core.borrow().initialized()
    }

    /// Whether an event source is currently bound.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.source.borrow().is_some()
    }

    /// A copyable view of the raw state.
    #[must_use]
    pub fn snapshot(&self) -> AxisSnapshot {
        let core = self.inner.core.borrow();
        AxisSnapshot {
            value: core.value,
            zone: core.initialized().then_some(core.zone),
            zone_stamp: core.zone_stamp,
        }
    }

    /// Observes a new value, reclassifying it into a [`Zone`].
    ///
    /// On a zone change the entry stamp updates and the zone-specific event
    /// fires before the generic value-changed event; within the same zone
    /// only the value updates and value-changed fires. A bit-identical value
    /// fires nothing.
    ///
    /// Rejected while an event source is bound.
    pub fn set_value(&mut self, value: f32) -> Result<(), MutationError> {
        if self.is_bound() {
            return Err(MutationError::SourceBound);
        }
        self.inner.apply(value, true);
        Ok(())
    }

    /// Whether the value classifies as [`Zone::Positive`]. `false` before the
    /// first set.
    #[inline]
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.zone() == Some(Zone::Positive)
    }

    /// Whether the value classifies as [`Zone::Neutral`]. `false` before the
    /// first set.
    #[inline]
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.zone() == Some(Zone::Neutral)
    }

    /// Whether the value classifies as [`Zone::Negative`]. `false` before the
    /// first set.
    #[inline]
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.zone() == Some(Zone::Negative)
    }

    /// Frames spent in `zone`, or `None` if it is not the current zone.
    #[must_use]
    pub fn zone_duration_frames(&self, zone: Zone) -> Option<u64> {
        let stamp = self.inner.core.borrow().zone_entry(zone)?;
        Some(stamp.elapsed_frames(self.inner.clock.stamp()))
    }

    /// Seconds spent in `zone`, or `None` if it is not the current zone.
    #[must_use]
    pub fn zone_duration_secs(&self, zone: Zone) -> Option<f32> {
        let stamp = self.inner.core.borrow().zone_entry(zone)?;
        Some(stamp.elapsed_secs(self.inner.clock.stamp()))
    }

    /// Frames spent in the positive zone, or `None` if not currently there.
    #[must_use]
    pub fn positive_duration_frames(&self) -> Option<u64> {
        self.zone_duration_frames(Zone::Positive)
    }

    /// Seconds spent in the positive zone, or `None` if not currently there.
    #[must_use]
    pub fn positive_duration_secs(&self) -> Option<f32> {
        self.zone_duration_secs(Zone::Positive)
    }

    /// Frames spent in the neutral zone, or `None` if not currently there.
    #[must_use]
    pub fn neutral_duration_frames(&self) -> Option<u64> {
        self.zone_duration_frames(Zone::Neutral)
    }

    /// Seconds spent in the neutral zone, or `None` if not currently there.
    #[must_use]
    pub fn neutral_duration_secs(&self) -> Option<f32> {
        self.zone_duration_secs(Zone::Neutral)
    }

    /// Frames spent in the negative zone, or `None` if not currently there.
    #[must_use]
    pub fn negative_duration_frames(&self) -> Option<u64> {
        self.zone_duration_frames(Zone::Negative)
    }

    /// Seconds spent in the negative zone, or `None` if not currently there.
    #[must_use]
    pub fn negative_duration_secs(&self) -> Option<f32> {
        self.zone_duration_secs(Zone::Negative)
    }

    /// Whether the value has stayed in `zone` for at least `threshold`
    /// frames.
    #[must_use]
    pub fn in_zone_for_frames(&self, zone: Zone, threshold: u64) -> bool {
        self.zone_duration_frames(zone)
            .is_some_and(|frames| frames >= threshold)
    }

    /// Whether the value has stayed in `zone` for at least `threshold`
    /// seconds.
    ///
    /// Fails if `threshold` is negative or not finite, leaving all state
    /// unchanged.
    pub fn in_zone_for_secs(&self, zone: Zone, threshold: f32) -> Result<bool, NegativeThreshold> {
        check_threshold(threshold)?;
        Ok(self
            .zone_duration_secs(zone)
            .is_some_and(|secs| secs >= threshold))
    }

    /// Whether the value has stayed positive for at least `threshold` frames.
    #[must_use]
    pub fn positive_for_frames(&self, threshold: u64) -> bool {
        self.in_zone_for_frames(Zone::Positive, threshold)
    }

    /// Whether the value has stayed positive for at least `threshold`
    /// seconds. Fails on a negative or non-finite threshold.
    pub fn positive_for_secs(&self, threshold: f32) -> Result<bool, NegativeThreshold> {
        self.in_zone_for_secs(Zone::Positive, threshold)
    }

    /// Whether the value has stayed neutral for at least `threshold` frames.
    #[must_use]
    pub fn neutral_for_frames(&self, threshold: u64) -> bool {
        self.in_zone_for_frames(Zone::Neutral, threshold)
    }

    /// Whether the value has stayed neutral for at least `threshold` seconds.
    /// Fails on a negative or non-finite threshold.
    pub fn neutral_for_secs(&self, threshold: f32) -> Result<bool, NegativeThreshold> {
        self.in_zone_for_secs(Zone::Neutral, threshold)
    }

    /// Whether the value has stayed negative for at least `threshold` frames.
    #[must_use]
    pub fn negative_for_frames(&self, threshold: u64) -> bool {
        self.in_zone_for_frames(Zone::Negative, threshold)
    }

    /// Whether the value has stayed negative for at least `threshold`
    /// seconds. Fails on a negative or non-finite threshold.
    pub fn negative_for_secs(&self, threshold: f32) -> Result<bool, NegativeThreshold> {
        self.in_zone_for_secs(Zone::Negative, threshold)
    }

    /// Whether the raw value is strictly above `threshold`.
    ///
    /// The comparison operators are pure value comparisons, independent of
    /// zone bookkeeping and the initialized flag.
    #[inline]
    #[must_use]
    pub fn above(&self, threshold: f32) -> bool {
        self.value() > threshold
    }

    /// Whether the raw value is at or above `threshold`.
    #[inline]
    #[must_use]
    pub fn above_or_equal(&self, threshold: f32) -> bool {
        self.value() >= threshold
    }

    /// Whether the raw value is strictly below `threshold`.
    #[inline]
    #[must_use]
    pub fn below(&self, threshold: f32) -> bool {
        self.value() < threshold
    }

    /// Whether the raw value is at or below `threshold`.
    #[inline]
    #[must_use]
    pub fn below_or_equal(&self, threshold: f32) -> bool {
        self.value() <= threshold
    }

    /// Whether the raw value equals `threshold` exactly.
    #[inline]
    #[must_use]
    pub fn equals(&self, threshold: f32) -> bool {
        self.value() == threshold
    }

    /// Registers a handler fired with the new value on entry into the
    /// positive zone, before the generic value-changed handlers.
    ///
    /// Handlers run synchronously in subscription order and must not mutate
    /// this signal or register further handlers from inside the call.
    pub fn on_positive(&mut self, handler: impl FnMut(f32) + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .positive
            .push(Box::new(handler));
    }

    /// Registers a handler fired with the new value on entry into the
    /// neutral zone.
    pub fn on_neutral(&mut self, handler: impl FnMut(f32) + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .neutral
            .push(Box::new(handler));
    }

    /// Registers a handler fired with the new value on entry into the
    /// negative zone.
    pub fn on_negative(&mut self, handler: impl FnMut(f32) + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .negative
            .push(Box::new(handler));
    }

    /// Registers a handler fired with the new value on every value change.
    pub fn on_value_changed(&mut self, handler: impl FnMut(f32) + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .value_changed
            .push(Box::new(handler));
    }

    /// Binds this signal to an external event source.
    ///
    /// While bound, raised `Axis(v)` payloads set the value, cancellations
    /// reset it to `0.0`, and manual mutation is rejected with
    /// [`MutationError::SourceBound`].
    ///
    /// Fails if this signal is already bound, if the source feeds another
    /// signal, or if the source is not declared for axis payloads.
    pub fn bind(&mut self, source: &ActionSource) -> Result<(), BindError> {
        if self.is_bound() {
            return Err(BindError::AlreadyBound);
        }
        if source.kind() != PayloadKind::Axis {
            return Err(PayloadMismatch {
                expected: PayloadKind::Axis,
                found: source.kind(),
            }
            .into());
        }

        let raised = Rc::downgrade(&self.inner);
        let canceled = Rc::downgrade(&self.inner);
        source.attach(Subscription {
            on_raised: Box::new(move |value| {
                if let (Some(inner), SourceValue::Axis(value)) = (raised.upgrade(), value) {
                    inner.apply(value, true);
                }
            }),
            on_canceled: Box::new(move || {
                if let Some(inner) = canceled.upgrade() {
                    inner.apply(0.0, true);
                }
            }),
        })?;

        *self.inner.source.borrow_mut() = Some(source.clone());
        debug!("axis signal bound to {:?} source", source.kind());
        Ok(())
    }

    /// Detaches from the bound event source, if any, re-enabling manual
    /// mutation.
    ///
    /// Call this on teardown; it unconditionally removes the subscription
    /// installed by [`bind`](Self::bind).
    pub fn unbind(&mut self) {
        if let Some(source) = self.inner.source.borrow_mut().take() {
            source.detach();
            debug!("axis signal unbound");
        }
    }
}

impl Drop for AxisSignal {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl std::fmt::Debug for AxisSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxisSignal")
            .field("value", &self.value())
            .field("zone", &self.zone())
            .field("bound", &self.is_bound())
            .finish()
    }
}
