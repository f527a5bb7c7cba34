//! Two-state (pressed/released) signals with edge acceptance and buffered
//! lookback.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::errors::{check_threshold, BindError, MutationError, NegativeThreshold, PayloadMismatch};
use crate::event_source::{ActionSource, PayloadKind, SourceValue, Subscription};
use crate::frame_clock::{FrameClock, FrameStamp};

/// A copyable view of a button's raw state, for inspection or recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonSnapshot {
    /// Whether the button is currently pressed.
    pub pressed: bool,
    /// When the button last transitioned into the pressed state, if ever.
    pub press_stamp: Option<FrameStamp>,
    /// When the button last transitioned into the released state, if ever.
    pub release_stamp: Option<FrameStamp>,
}

#[derive(Debug, Default)]
struct ButtonCore {
    pressed: bool,
    press_available: bool,
    release_available: bool,
    press_stamp: Option<FrameStamp>,
    release_stamp: Option<FrameStamp>,
}

impl ButtonCore {
    fn initialized(&self) -> bool {
        self.press_stamp.is_some() || self.release_stamp.is_some()
    }

    /// The stamp of the most recent transition into one state, if any.
    fn edge_stamp(&self, pressed: bool) -> Option<FrameStamp> {
        if pressed {
            self.press_stamp
        } else {
            self.release_stamp
        }
    }

    /// The stamp of an available edge whose state is still current.
    fn live_edge(&self, pressed: bool) -> Option<FrameStamp> {
        let available = if pressed {
            self.press_available
        } else {
            self.release_available
        };
        if available && self.pressed == pressed {
            self.edge_stamp(pressed)
        } else {
            None
        }
    }

    /// The stamp a duration query measures from, if the query applies.
    ///
    /// Requires the queried state to be current and its stamp to not predate
    /// the opposite edge's stamp.
    fn duration_stamp(&self, pressed: bool) -> Option<FrameStamp> {
        if self.pressed != pressed {
            return None;
        }
        let (stamp, opposite) = if pressed {
            (self.press_stamp, self.release_stamp)
        } else {
            (self.release_stamp, self.press_stamp)
        };
        let stamp = stamp?;
        match opposite {
            Some(other) if other.frame > stamp.frame => None,
            _ => Some(stamp),
        }
    }
}

#[derive(Default)]
struct ButtonHandlers {
    pressed: Vec<Box<dyn FnMut()>>,
    released: Vec<Box<dyn FnMut()>>,
    value_changed: Vec<Box<dyn FnMut(bool)>>,
}

struct ButtonInner {
    clock: FrameClock,
    core: RefCell<ButtonCore>,
    handlers: RefCell<ButtonHandlers>,
    source: RefCell<Option<ActionSource>>,
}

impl ButtonInner {
    /// Applies a press or release observation, firing events on a transition.
    ///
    /// Setting the state the signal is already in is a no-op.
    fn apply(&self, pressed: bool) {
        let stamp = self.clock.stamp();
        {
            let mut core = self.core.borrow_mut();
            if core.pressed == pressed {
                return;
            }

            core.pressed = pressed;
            if pressed {
                core.press_available = true;
                core.release_available = false;
                core.press_stamp = Some(stamp);
            } else {
                core.release_available = true;
                core.press_available = false;
                core.release_stamp = Some(stamp);
            }
        }
        trace!(
            "button {} at frame {}",
            if pressed { "pressed" } else { "released" },
            stamp.frame
        );

        // Flags and stamps are settled before any handler runs, so handlers
        // observe fully up-to-date state. Edge-specific handlers fire first.
        let mut handlers = self.handlers.borrow_mut();
        let edge_handlers = if pressed {
            &mut handlers.pressed
        } else {
            &mut handlers.released
        };
        for handler in edge_handlers.iter_mut() {
            handler();
        }
        for handler in handlers.value_changed.iter_mut() {
            handler(pressed);
        }
    }
}

/// A two-state signal that timestamps every press/release edge and lets
/// pollers observe each edge exactly once.
///
/// Each transition raises an *availability flag* for its edge and records the
/// frame/time of the transition. Queries such as [`pressed`](Self::pressed)
/// only report an edge while its flag is raised; [`accept`](Self::accept) (or
/// a `take_*` query) lowers both flags, so polling code sees a given physical
/// press at most once. The buffered queries
/// ([`pressed_within_frames`](Self::pressed_within_frames) and friends) allow
/// retroactive detection across a short lookback window, regardless of
/// whether the opposite edge has fired since.
///
/// Until the first transition the signal is *uninitialized*: every
/// availability query returns `false` and every duration query returns
/// `None`. There is no way back to the uninitialized state.
///
/// # Example
/// ```rust
/// use input_signal::prelude::*;
///
/// let clock = FrameClock::new();
/// let mut jump = ButtonSignal::new(clock.clone());
///
/// jump.press().unwrap();
/// assert!(jump.pressed());
/// assert!(jump.pressed_this_frame());
///
/// jump.accept();
/// assert!(!jump.pressed());
///
/// clock.step(1.0 / 60.0);
/// jump.release().unwrap();
///
/// // The press is still visible through a 5-frame lookback window.
/// assert!(jump.pressed_within_frames(5));
/// ```
pub struct ButtonSignal {
    inner: Rc<ButtonInner>,
}

impl ButtonSignal {
    /// Creates a released, uninitialized button reading from `clock`.
    #[must_use]
    pub fn new(clock: FrameClock) -> Self {
        Self {
            inner: Rc::new(ButtonInner {
                clock,
                core: RefCell::default(),
                handlers: RefCell::default(),
                source: RefCell::new(None),
            }),
        }
    }

    /// The raw pressed/released state.
    #[inline]
    #[must_use]
    pub fn value(&self) -> bool {
        self.inner.core.borrow().pressed
    }

    /// Whether at least one transition has occurred.
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
    pub fn snapshot(&self) -> ButtonSnapshot {
        let core = self.inner.core.borrow();
        ButtonSnapshot {
            pressed: core.pressed,
            press_stamp: core.press_stamp,
            release_stamp: core.release_stamp,
        }
    }

    fn ensure_manual(&self) -> Result<(), MutationError> {
        if self.is_bound() {
            Err(MutationError::SourceBound)
        } else {
            Ok(())
        }
    }

    /// Presses the button. No-op if already pressed.
    ///
    /// On a transition this stamps the press edge, makes it available, clears
    /// release availability, and fires [`on_pressed`](Self::on_pressed) then
    /// [`on_value_changed`](Self::on_value_changed), synchronously.
    pub fn press(&mut self) -> Result<(), MutationError> {
        self.ensure_manual()?;
        self.inner.apply(true);
        Ok(())
    }

    /// Releases the button. No-op if already released.
    ///
    /// The symmetric counterpart of [`press`](Self::press).
    pub fn release(&mut self) -> Result<(), MutationError> {
        self.ensure_manual()?;
        self.inner.apply(false);
        Ok(())
    }

    /// Releases the button if pressed, presses it otherwise.
    pub fn toggle(&mut self) -> Result<(), MutationError> {
        self.ensure_manual()?;
        let target = !self.value();
        self.inner.apply(target);
        Ok(())
    }

    /// Marks any detected edge as consumed, clearing both availability flags.
    ///
    /// The raw state and the edge timestamps are untouched, and no events
    /// fire. Permitted while a source is bound; acceptance is a consumer-side
    /// acknowledgment, not a mutation of the observed value.
    pub fn accept(&mut self) {
        let mut core = self.inner.core.borrow_mut();
        core.press_available = false;
        core.release_available = false;
    }

    fn take_if(&mut self, hit: bool) -> bool {
        if hit {
            self.accept();
        }
        hit
    }

    /// Whether the button is pressed and the press has not been accepted yet.
    #[inline]
    #[must_use]
    pub fn pressed(&self) -> bool {
        self.inner.core.borrow().live_edge(true).is_some()
    }

    /// Whether the button is released and the release has not been accepted
    /// yet. `false` until the first transition.
    #[inline]
    #[must_use]
    pub fn released(&self) -> bool {
        self.inner.core.borrow().live_edge(false).is_some()
    }

    /// [`pressed`](Self::pressed), accepting the edge when it returns `true`.
    pub fn take_pressed(&mut self) -> bool {
        let hit = self.pressed();
        self.take_if(hit)
    }

    /// [`released`](Self::released), accepting the edge when it returns
    /// `true`.
    pub fn take_released(&mut self) -> bool {
        let hit = self.released();
        self.take_if(hit)
    }

    /// Whether an unaccepted press happened on the current frame.
    #[must_use]
    pub fn pressed_this_frame(&self) -> bool {
        let now = self.inner.clock.frame();
        matches!(
            self.inner.core.borrow().live_edge(true),
            Some(stamp) if stamp.frame == now
        )
    }

    /// Whether an unaccepted release happened on the current frame.
    #[must_use]
    pub fn released_this_frame(&self) -> bool {
        let now = self.inner.clock.frame();
        matches!(
            self.inner.core.borrow().live_edge(false),
            Some(stamp) if stamp.frame == now
        )
    }

    /// [`pressed_this_frame`](Self::pressed_this_frame), accepting the edge
    /// when it returns `true`.
    pub fn take_pressed_this_frame(&mut self) -> bool {
        let hit = self.pressed_this_frame();
        self.take_if(hit)
    }

    /// [`released_this_frame`](Self::released_this_frame), accepting the edge
    /// when it returns `true`.
    pub fn take_released_this_frame(&mut self) -> bool {
        let hit = self.released_this_frame();
        self.take_if(hit)
    }

    fn edge_within_frames(&self, pressed: bool, window: u64) -> bool {
        let now = self.inner.clock.stamp();
        let stamp = self.inner.core.borrow().edge_stamp(pressed);
        matches!(stamp, Some(stamp) if stamp.within_frames(now, window))
    }

    fn edge_within_secs(&self, pressed: bool, window: f32) -> Result<bool, NegativeThreshold> {
        check_threshold(window)?;
        let now = self.inner.clock.stamp();
        let stamp = self.inner.core.borrow().edge_stamp(pressed);
        Ok(matches!(stamp, Some(stamp) if stamp.within_secs(now, window)))
    }

    /// Whether a press happened within the last `window` frames, regardless
    /// of acceptance and of whether a release has occurred since.
    ///
    /// This is a lookback, not a "still held" query: a press at frame `P`
    /// queried at frame `F` matches iff `F - P <= window`.
    #[must_use]
    pub fn pressed_within_frames(&self, window: u64) -> bool {
        self.edge_within_frames(true, window)
    }

    /// Whether a release happened within the last `window` frames, regardless
    /// of acceptance and of whether a press has occurred since.
    #[must_use]
    pub fn released_within_frames(&self, window: u64) -> bool {
        self.edge_within_frames(false, window)
    }

    /// [`pressed_within_frames`](Self::pressed_within_frames), accepting the
    /// edge when it returns `true`.
    pub fn take_pressed_within_frames(&mut self, window: u64) -> bool {
        let hit = self.pressed_within_frames(window);
        self.take_if(hit)
    }

    /// [`released_within_frames`](Self::released_within_frames), accepting
    /// the edge when it returns `true`.
    pub fn take_released_within_frames(&mut self, window: u64) -> bool {
        let hit = self.released_within_frames(window);
        self.take_if(hit)
    }

    /// Whether a press happened within the last `window` seconds of unscaled
    /// time, regardless of acceptance and of subsequent releases.
    ///
    /// Fails if `window` is negative or not finite, leaving all state
    /// unchanged.
    pub fn pressed_within_secs(&self, window: f32) -> Result<bool, NegativeThreshold> {
        self.edge_within_secs(true, window)
    }

    /// Whether a release happened within the last `window` seconds of
    /// unscaled time, regardless of acceptance and of subsequent presses.
    ///
    /// Fails if `window` is negative or not finite, leaving all state
    /// unchanged.
    pub fn released_within_secs(&self, window: f32) -> Result<bool, NegativeThreshold> {
        self.edge_within_secs(false, window)
    }

    /// [`pressed_within_secs`](Self::pressed_within_secs), accepting the edge
    /// when it resolves to `true`.
    pub fn take_pressed_within_secs(&mut self, window: f32) -> Result<bool, NegativeThreshold> {
        let hit = self.pressed_within_secs(window)?;
        Ok(self.take_if(hit))
    }

    /// [`released_within_secs`](Self::released_within_secs), accepting the
    /// edge when it resolves to `true`.
    pub fn take_released_within_secs(&mut self, window: f32) -> Result<bool, NegativeThreshold> {
        let hit = self.released_within_secs(window)?;
        Ok(self.take_if(hit))
    }

    /// Frames the button has been held pressed, or `None` if it is not
    /// currently pressed (or was never pressed).
    #[must_use]
    pub fn press_duration_frames(&self) -> Option<u64> {
        let stamp = self.inner.core.borrow().duration_stamp(true)?;
        Some(stamp.elapsed_frames(self.inner.clock.stamp()))
    }

    /// Seconds the button has been held pressed, or `None` if it is not
    /// currently pressed (or was never pressed).
    #[must_use]
    pub fn press_duration_secs(&self) -> Option<f32> {
        let stamp = self.inner.core.borrow().duration_stamp(true)?;
        Some(stamp.elapsed_secs(self.inner.clock.stamp()))
    }

    /// Frames the button has been left released, or `None` if it is not
    /// currently released or has never transitioned.
    #[must_use]
    pub fn release_duration_frames(&self) -> Option<u64> {
        let stamp = self.inner.core.borrow().duration_stamp(false)?;
        Some(stamp.elapsed_frames(self.inner.clock.stamp()))
    }

    /// Seconds the button has been left released, or `None` if it is not
    /// currently released or has never transitioned.
    #[must_use]
    pub fn release_duration_secs(&self) -> Option<f32> {
        let stamp = self.inner.core.borrow().duration_stamp(false)?;
        Some(stamp.elapsed_secs(self.inner.clock.stamp()))
    }

    /// Whether the button has been held pressed for at least `threshold`
    /// frames.
    #[must_use]
    pub fn pressed_for_frames(&self, threshold: u64) -> bool {
        self.press_duration_frames()
            .is_some_and(|frames| frames >= threshold)
    }

    /// Whether the button has been left released for at least `threshold`
    /// frames.
    #[must_use]
    pub fn released_for_frames(&self, threshold: u64) -> bool {
        self.release_duration_frames()
            .is_some_and(|frames| frames >= threshold)
    }

    /// Whether the button has been held pressed for at least `threshold`
    /// seconds.
    ///
    /// Fails if `threshold` is negative or not finite.
    pub fn pressed_for_secs(&self, threshold: f32) -> Result<bool, NegativeThreshold> {
        check_threshold(threshold)?;
        Ok(self
            .press_duration_secs()
            .is_some_and(|secs| secs >= threshold))
    }

    /// Whether the button has been left released for at least `threshold`
    /// seconds.
    ///
    /// Fails if `threshold` is negative or not finite.
    pub fn released_for_secs(&self, threshold: f32) -> Result<bool, NegativeThreshold> {
        check_threshold(threshold)?;
        Ok(self
            .release_duration_secs()
            .is_some_and(|secs| secs >= threshold))
    }

    /// Registers a handler fired on every press transition, before the
    /// generic value-changed handlers.
    ///
    /// Handlers run synchronously in subscription order and must not mutate
    /// this signal or register further handlers from inside the call.
    pub fn on_pressed(&mut self, handler: impl FnMut() + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .pressed
            .push(Box::new(handler));
    }

    /// Registers a handler fired on every release transition, before the
    /// generic value-changed handlers.
    pub fn on_released(&mut self, handler: impl FnMut() + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .released
            .push(Box::new(handler));
    }

    /// Registers a handler fired on every transition with the new value.
    pub fn on_value_changed(&mut self, handler: impl FnMut(bool) + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .value_changed
            .push(Box::new(handler));
    }

    /// Binds this signal to an external event source.
    ///
    /// While bound, raised `Button(true)` payloads press the signal, raised
    /// `Button(false)` payloads and cancellations release it, and manual
    /// mutation is rejected with [`MutationError::SourceBound`].
    ///
    /// Fails if this signal is already bound, if the source feeds another
    /// signal, or if the source is not declared for button payloads.
    pub fn bind(&mut self, source: &ActionSource) -> Result<(), BindError> {
        if self.is_bound() {
            return Err(BindError::AlreadyBound);
        }
        if source.kind() != PayloadKind::Button {
            return Err(PayloadMismatch {
                expected: PayloadKind::Button,
                found: source.kind(),
            }
            .into());
        }

        let raised = Rc::downgrade(&self.inner);
        let canceled = Rc::downgrade(&self.inner);
        source.attach(Subscription {
            on_raised: Box::new(move |value| {
                if let (Some(inner), SourceValue::Button(pressed)) = (raised.upgrade(), value) {
                    inner.apply(pressed);
                }
            }),
            on_canceled: Box::new(move || {
                if let Some(inner) = canceled.upgrade() {
                    inner.apply(false);
                }
            }),
        })?;

        *self.inner.source.borrow_mut() = Some(source.clone());
        debug!("button signal bound to {:?} source", source.kind());
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
            debug!("button signal unbound");
        }
    }
}

impl Drop for ButtonSignal {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl std::fmt::Debug for ButtonSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ButtonSignal")
            .field("value", &self.value())
            .field("initialized", &self.is_initialized())
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_idempotent() {
        let clock = FrameClock::new();
        let mut button = ButtonSignal::new(clock.clone());

        button.press().unwrap();
        let first = button.snapshot();

        clock.step(0.016);
        button.press().unwrap();

        // The repeat press neither restamps nor re-raises availability.
        assert_eq!(button.snapshot(), first);
    }

    #[test]
    fn release_on_a_fresh_button_does_not_initialize() {
        let clock = FrameClock::new();
        let mut button = ButtonSignal::new(clock);

        button.release().unwrap();

        assert!(!button.is_initialized());
        assert!(!button.released());
        assert_eq!(button.release_duration_frames(), None);
    }

    #[test]
    fn toggle_alternates_states() {
        let clock = FrameClock::new();
        let mut button = ButtonSignal::new(clock);

        button.toggle().unwrap();
        assert!(button.value());

        button.toggle().unwrap();
        assert!(!button.value());
    }

    #[test]
    fn duration_guard_rejects_stale_press_stamp() {
        let clock = FrameClock::new();
        let mut button = ButtonSignal::new(clock.clone());

        button.press().unwrap();
        clock.step(0.016);
        button.release().unwrap();

        // Released now, so the press duration no longer applies.
        assert_eq!(button.press_duration_frames(), None);
        assert_eq!(button.release_duration_frames(), Some(0));

        clock.step(0.016);
        assert_eq!(button.release_duration_frames(), Some(1));
    }
}
