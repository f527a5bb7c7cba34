//! The subscribe/unsubscribe capability that drives bound signals.
//!
//! An [`ActionSource`] stands in for an external input action: something that
//! can be *raised* with a typed payload or *canceled* (reset to default). The
//! signals in this crate do not care where those notifications originate;
//! tests and manual drivers call [`ActionSource::raise`] directly, while a
//! real backend would funnel its per-frame callbacks into the same methods.
//!
//! A source feeds at most one signal at a time. Binding validates that the
//! source's declared [`PayloadKind`] matches the signal type, and a second
//! bind attempt fails instead of silently replacing the first.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use derive_more::Display;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::errors::{BindError, PayloadMismatch};

/// The payload shape an event source is declared for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
pub enum PayloadKind {
    /// Pressed/released payloads (`bool`), consumed by
    /// [`ButtonSignal`](crate::buttonlike::ButtonSignal).
    #[display(fmt = "button")]
    Button,
    /// Single-axis payloads (`f32`), consumed by
    /// [`AxisSignal`](crate::axislike::AxisSignal).
    #[display(fmt = "axis")]
    Axis,
    /// Two-axis payloads ([`Vec2`]), consumed by
    /// [`DualAxisSignal`](crate::dual_axislike::DualAxisSignal).
    #[display(fmt = "dual-axis")]
    DualAxis,
}

/// A typed payload delivered by [`ActionSource::raise`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceValue {
    /// A pressed/released observation.
    Button(bool),
    /// A single-axis observation.
    Axis(f32),
    /// A two-axis observation.
    DualAxis(Vec2),
}

impl SourceValue {
    /// The payload shape this value carries.
    #[must_use]
    pub fn kind(&self) -> PayloadKind {
        match self {
            SourceValue::Button(_) => PayloadKind::Button,
            SourceValue::Axis(_) => PayloadKind::Axis,
            SourceValue::DualAxis(_) => PayloadKind::DualAxis,
        }
    }
}

/// The handler pair a signal installs when it binds to a source.
pub(crate) struct Subscription {
    pub(crate) on_raised: Box<dyn FnMut(SourceValue)>,
    pub(crate) on_canceled: Box<dyn FnMut()>,
}

struct SourceInner {
    kind: PayloadKind,
    subscriber: Option<Subscription>,
    // Bumped on every detach so a handler that unbinds during delivery is not
    // silently re-attached afterwards.
    detach_epoch: u64,
}

/// An external event source a signal can bind to.
///
/// Cloning yields another handle to the same source; delivery is synchronous
/// and happens on the caller's thread before `raise`/`cancel` return.
///
/// # Example
/// ```rust
/// use input_signal::prelude::*;
///
/// let clock = FrameClock::new();
/// let source = ActionSource::new(PayloadKind::Button);
/// let mut button = ButtonSignal::new(clock.clone());
///
/// button.bind(&source).unwrap();
/// source.raise(SourceValue::Button(true)).unwrap();
///
/// assert!(button.pressed());
/// ```
#[derive(Clone)]
pub struct ActionSource {
    inner: Rc<RefCell<SourceInner>>,
}

impl ActionSource {
    /// Creates a new source declared for the given payload shape.
    #[must_use]
    pub fn new(kind: PayloadKind) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SourceInner {
                kind,
                subscriber: None,
                detach_epoch: 0,
            })),
        }
    }

    /// The payload shape this source was declared for.
    #[must_use]
    pub fn kind(&self) -> PayloadKind {
        self.inner.borrow().kind
    }

    /// Whether a signal is currently subscribed to this source.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.borrow().subscriber.is_some()
    }

    /// Raises the source with a typed payload, delivering it synchronously to
    /// the bound signal, if any.
    ///
    /// Fails without delivering anything if the payload shape does not match
    /// the declared [`PayloadKind`].
    pub fn raise(&self, value: SourceValue) -> Result<(), PayloadMismatch> {
        let expected = self.kind();
        if value.kind() != expected {
            return Err(PayloadMismatch {
                expected,
                found: value.kind(),
            });
        }

        self.deliver(|subscription| (subscription.on_raised)(value));
        Ok(())
    }

    /// Cancels the source, delivering a reset-to-default notification to the
    /// bound signal, if any.
    ///
    /// Signals interpret this as release / neutral / zero vector depending on
    /// their type.
    pub fn cancel(&self) {
        self.deliver(|subscription| (subscription.on_canceled)());
    }

    fn deliver(&self, invoke: impl FnOnce(&mut Subscription)) {
        // The subscription is taken out of the slot for the duration of the
        // call so the handler may freely query its signal.
        let (subscription, epoch) = {
            let mut inner = self.inner.borrow_mut();
            (inner.subscriber.take(), inner.detach_epoch)
        };

        if let Some(mut subscription) = subscription {
            invoke(&mut subscription);

            let mut inner = self.inner.borrow_mut();
            if inner.detach_epoch == epoch && inner.subscriber.is_none() {
                inner.subscriber = Some(subscription);
            }
        }
    }

    pub(crate) fn attach(&self, subscription: Subscription) -> Result<(), BindError> {
        let mut inner = self.inner.borrow_mut();
        if inner.subscriber.is_some() {
            return Err(BindError::SourceOccupied);
        }

        inner.subscriber = Some(subscription);
        Ok(())
    }

    pub(crate) fn detach(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.subscriber = None;
        inner.detach_epoch += 1;
    }
}

impl fmt::Debug for ActionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSource")
            .field("kind", &self.kind())
            .field("bound", &self.is_bound())
            .finish()
    }
}
