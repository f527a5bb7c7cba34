//! Paired 2D signals composed from two continuous axes.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use log::debug;

use crate::axislike::AxisSignal;
use crate::errors::{BindError, MutationError, PayloadMismatch};
use crate::event_source::{ActionSource, PayloadKind, SourceValue, Subscription};
use crate::frame_clock::FrameClock;

#[derive(Default)]
struct PairHandlers {
    value_changed: Vec<Box<dyn FnMut(Vec2)>>,
}

struct PairInner {
    x: AxisSignal,
    y: AxisSignal,
    handlers: RefCell<PairHandlers>,
    source: RefCell<Option<ActionSource>>,
}

impl PairInner {
    /// Applies a 2D observation: both member axes update silently (zone
    /// stamps included, member events suppressed), then exactly one unified
    /// value-changed event fires.
    fn apply(&self, value: Vec2) {
        let initialized = self.x.is_initialized() && self.y.is_initialized();
        if initialized
            && self.x.value().to_bits() == value.x.to_bits()
            && self.y.value().to_bits() == value.y.to_bits()
        {
            return;
        }

        self.x.inner().apply(value.x, false);
        self.y.inner().apply(value.y, false);

        for handler in self.handlers.borrow_mut().value_changed.iter_mut() {
            handler(value);
        }
    }
}

/// Two [`AxisSignal`]s composed into a single 2D signal.
///
/// The pair owns its member axes exclusively: they are only reachable through
/// the read-only references returned by [`axis_x`](Self::axis_x) and
/// [`axis_y`](Self::axis_y), so nothing but the pair can write to them (every
/// mutating axis method requires `&mut`). When the pair updates them it
/// suppresses their per-axis events and emits a single unified value-changed
/// event instead; zone entry stamps on the members still update normally, so
/// detailed per-axis duration queries keep working.
///
/// The 2D value is always derived from the members, never stored separately.
///
/// # Example
/// ```rust
/// use input_signal::prelude::*;
/// use glam::Vec2;
///
/// let clock = FrameClock::new();
/// let mut stick = DualAxisSignal::new(clock);
///
/// stick.set_value(Vec2::new(0.6, -0.4)).unwrap();
/// assert_eq!(stick.value(), Vec2::new(0.6, -0.4));
/// assert!(stick.axis_x().is_positive());
/// assert!(stick.axis_y().is_negative());
/// assert!(!stick.is_neutral());
/// ```
pub struct DualAxisSignal {
    inner: Rc<PairInner>,
}

impl DualAxisSignal {
    /// Creates a neutral, uninitialized pair whose member axes read from
    /// `clock`.
    #[must_use]
    pub fn new(clock: FrameClock) -> Self {
        Self {
            inner: Rc::new(PairInner {
                x: AxisSignal::new(clock.clone()),
                y: AxisSignal::new(clock),
                handlers: RefCell::default(),
                source: RefCell::new(None),
            }),
        }
    }

    /// The 2D value, derived from the member axes.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Vec2 {
        Vec2::new(self.inner.x.value(), self.inner.y.value())
    }

    /// Read-only access to the X member axis for detailed per-axis queries.
    #[inline]
    #[must_use]
    pub fn axis_x(&self) -> &AxisSignal {
        &self.inner.x
    }

    /// Read-only access to the Y member axis for detailed per-axis queries.
    #[inline]
    #[must_use]
    pub fn axis_y(&self) -> &AxisSignal {
        &self.inner.y
    }

    /// Whether both member axes have observed at least one value.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.x.is_initialized() && self.inner.y.is_initialized()
    }

    /// Whether an event source is currently bound.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.source.borrow().is_some()
    }

    /// Whether both member axes classify as neutral. `false` while either
    /// axis is uninitialized.
    #[inline]
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.inner.x.is_neutral() && self.inner.y.is_neutral()
    }

    /// Observes a new 2D value.
    ///
    /// Both member axes update with their per-axis events suppressed, then
    /// exactly one unified value-changed event fires with the pair. A
    /// bit-identical value fires nothing.
    ///
    /// Rejected while an event source is bound.
    pub fn set_value(&mut self, value: Vec2) -> Result<(), MutationError> {
        if self.is_bound() {
            return Err(MutationError::SourceBound);
        }
        self.inner.apply(value);
        Ok(())
    }

    /// The unsigned angle in degrees (`0.0..=180.0`) between the current
    /// value and the canonical up direction ([`Vec2::Y`]).
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle_from(Vec2::Y)
    }

    /// The unsigned angle in degrees (`0.0..=180.0`) between the current
    /// value and `reference`.
    ///
    /// Returns `0.0` when either vector is (numerically) zero-length, so a
    /// centered stick never produces `NaN`.
    #[must_use]
    pub fn angle_from(&self, reference: Vec2) -> f32 {
        let value = self.value();
        let denominator = value.length() * reference.length();
        if denominator <= f32::EPSILON {
            return 0.0;
        }

        let cos = (value.dot(reference) / denominator).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }

    /// Registers a handler fired with the new pair on every value change.
    ///
    /// Handlers run synchronously in subscription order and must not mutate
    /// this signal or register further handlers from inside the call.
    pub fn on_value_changed(&mut self, handler: impl FnMut(Vec2) + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .value_changed
            .push(Box::new(handler));
    }

    /// Binds this signal to an external event source.
    ///
    /// While bound, raised `DualAxis(v)` payloads set the pair, cancellations
    /// reset it to [`Vec2::ZERO`], and manual mutation is rejected with
    /// [`MutationError::SourceBound`].
    ///
    /// Fails if this signal is already bound, if the source feeds another
    /// signal, or if the source is not declared for dual-axis payloads.
    pub fn bind(&mut self, source: &ActionSource) -> Result<(), BindError> {
        if self.is_bound() {
            return Err(BindError::AlreadyBound);
        }
        if source.kind() != PayloadKind::DualAxis {
            return Err(PayloadMismatch {
                expected: PayloadKind::DualAxis,
                found: source.kind(),
            }
            .into());
        }

        let raised = Rc::downgrade(&self.inner);
        let canceled = Rc::downgrade(&self.inner);
        source.attach(Subscription {
            on_raised: Box::new(move |value| {
                if let (Some(inner), SourceValue::DualAxis(pair)) = (raised.upgrade(), value) {
                    inner.apply(pair);
                }
            }),
            on_canceled: Box::new(move || {
                if let Some(inner) = canceled.upgrade() {
                    inner.apply(Vec2::ZERO);
                }
            }),
        })?;

        *self.inner.source.borrow_mut() = Some(source.clone());
        debug!("dual-axis signal bound to {:?} source", source.kind());
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
            debug!("dual-axis signal unbound");
        }
    }
}

impl Drop for DualAxisSignal {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl std::fmt::Debug for DualAxisSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualAxisSignal")
            .field("value", &self.value())
            .field("bound", &self.is_bound())
            .finish()
    }
}
