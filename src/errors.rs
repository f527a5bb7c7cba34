//! Errors surfaced when configuring or mutating signals.
//!
//! Every error here is a programmer error (bad argument or bad lifecycle
//! order), never a transient condition: a failed call leaves all observable
//! state unchanged, and there is no retry logic anywhere in this crate.
//! Querying an uninitialized signal is deliberately *not* an error; those
//! queries resolve to `false` or `None` instead.

use derive_more::{Display, Error};

use crate::event_source::PayloadKind;

/// The payload shape of an event source does not match what the consumer
/// expects.
///
/// Returned by [`ActionSource::raise`](crate::event_source::ActionSource::raise)
/// when the supplied value has the wrong shape, and wrapped in
/// [`BindError::Mismatch`] when a signal is bound to a source declared for a
/// different shape.
#[derive(Debug, Clone, Copy, Error, Display, PartialEq, Eq)]
#[display(fmt = "payload shape mismatch: expected {}, found {}", expected, found)]
pub struct PayloadMismatch {
    /// The shape the consumer was declared for.
    pub expected: PayloadKind,
    /// The shape that was actually supplied.
    pub found: PayloadKind,
}

/// A configuration error raised while binding a signal to an event source.
#[derive(Debug, Clone, Copy, Error, Display, PartialEq, Eq)]
pub enum BindError {
    /// The signal is already bound to an event source; rebinding must fail
    /// rather than silently replace the existing binding.
    #[display(fmt = "signal is already bound to an event source")]
    AlreadyBound,
    /// The event source already feeds another signal; a source is exclusively
    /// owned by at most one signal at a time.
    #[display(fmt = "event source already has a subscriber")]
    SourceOccupied,
    /// The source's declared payload shape does not match the signal type.
    #[display(fmt = "{}", _0)]
    Mismatch(#[error(source)] PayloadMismatch),
}

impl From<PayloadMismatch> for BindError {
    fn from(mismatch: PayloadMismatch) -> Self {
        BindError::Mismatch(mismatch)
    }
}

/// A capability violation: manual mutation attempted on a signal that is
/// currently driven by a bound event source.
///
/// Manual mutation and source-driven updates are mutually exclusive; unbind
/// the source first.
#[derive(Debug, Clone, Copy, Error, Display, PartialEq, Eq)]
pub enum MutationError {
    /// An event source is bound, so `press`/`release`/`set_value` and friends
    /// are rejected.
    #[display(fmt = "manual mutation is disabled while an event source is bound")]
    SourceBound,
}

/// A precondition violation: a duration threshold or lookback window given in
/// seconds was negative or not finite.
///
/// Frame-valued windows take `u64` arguments, so the equivalent mistake is
/// unrepresentable there.
#[derive(Debug, Clone, Copy, Error, Display, PartialEq)]
#[display(
    fmt = "threshold must be a finite, non-negative number of seconds, got {}",
    value
)]
pub struct NegativeThreshold {
    /// The rejected value.
    #[error(not(source))]
    pub value: f32,
}

/// Validates a second-valued threshold or window argument.
pub(crate) fn check_threshold(value: f32) -> Result<(), NegativeThreshold> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(NegativeThreshold { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_reject_negative_and_non_finite_values() {
        assert!(check_threshold(0.0).is_ok());
        assert!(check_threshold(2.5).is_ok());

        assert_eq!(
            check_threshold(-0.1),
            Err(NegativeThreshold { value: -0.1 })
        );
        assert!(check_threshold(f32::NAN).is_err());
        assert!(check_threshold(f32::INFINITY).is_err());
    }

    #[test]
    fn mismatch_display_names_both_shapes() {
        let mismatch = PayloadMismatch {
            expected: PayloadKind::Axis,
            found: PayloadKind::DualAxis,
        };

        assert_eq!(
            mismatch.to_string(),
            "payload shape mismatch: expected axis, found dual-axis"
        );
    }
}
