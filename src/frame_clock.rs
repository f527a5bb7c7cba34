//! The injected frame-index and unscaled-time source that signals read from.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// A monotonically non-decreasing frame counter paired with unscaled wall time.
///
/// Signals never read a global clock: the update loop that owns them advances
/// a single [`FrameClock`] once per frame, and every signal created from it
/// observes the same frame index and time for the whole update cycle.
///
/// Cloning is cheap and shares the underlying counters.
///
/// # Example
/// ```rust
/// use input_signal::frame_clock::FrameClock;
///
/// let clock = FrameClock::new();
/// assert_eq!(clock.frame(), 0);
///
/// clock.step(1.0 / 60.0);
/// assert_eq!(clock.frame(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    inner: Rc<ClockCells>,
}

#[derive(Debug, Default)]
struct ClockCells {
    frame: Cell<u64>,
    time: Cell<f32>,
}

impl FrameClock {
    /// Creates a clock at frame `0`, time `0.0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current frame index.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.inner.frame.get()
    }

    /// The current unscaled time in seconds.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.inner.time.get()
    }

    /// The current frame and time as a single [`FrameStamp`].
    #[inline]
    #[must_use]
    pub fn stamp(&self) -> FrameStamp {
        FrameStamp {
            frame: self.frame(),
            time: self.time(),
        }
    }

    /// Jumps the clock to the given frame index and unscaled time.
    ///
    /// Both values must be non-decreasing across calls; that is the caller's
    /// contract and is only checked in debug builds.
    pub fn advance_to(&self, frame: u64, time: f32) {
        debug_assert!(frame >= self.frame(), "frame index moved backwards");
        debug_assert!(time >= self.time(), "unscaled time moved backwards");

        self.inner.frame.set(frame);
        self.inner.time.set(time);
    }

    /// Advances the clock by one frame and `delta_secs` seconds.
    pub fn step(&self, delta_secs: f32) {
        self.advance_to(self.frame() + 1, self.time() + delta_secs);
    }
}

/// The frame index and unscaled time at which a transition was observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameStamp {
    /// The frame index at the moment of the transition.
    pub frame: u64,
    /// The unscaled time, in seconds, at the moment of the transition.
    pub time: f32,
}

impl FrameStamp {
    /// Whole frames elapsed between this stamp and `now`.
    #[inline]
    #[must_use]
    pub fn elapsed_frames(&self, now: FrameStamp) -> u64 {
        now.frame.saturating_sub(self.frame)
    }

    /// Seconds elapsed between this stamp and `now`.
    #[inline]
    #[must_use]
    pub fn elapsed_secs(&self, now: FrameStamp) -> f32 {
        (now.time - self.time).max(0.0)
    }

    /// Whether this stamp falls within the last `window` frames of `now`.
    ///
    /// A `window` of `0` only matches the current frame.
    #[inline]
    #[must_use]
    pub fn within_frames(&self, now: FrameStamp, window: u64) -> bool {
        self.frame >= now.frame.saturating_sub(window)
    }

    /// Whether this stamp falls within the last `window` seconds of `now`.
    #[inline]
    #[must_use]
    pub fn within_secs(&self, now: FrameStamp, window: f32) -> bool {
        self.time >= now.time - window
    }
}
