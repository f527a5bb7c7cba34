#![forbid(missing_docs)]
#![forbid(unsafe_code)]
#![warn(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

pub mod axislike;
pub mod buttonlike;
pub mod dual_axislike;
pub mod errors;
pub mod event_source;
pub mod frame_clock;

/// Everything you need to get started
pub mod prelude {
    pub use crate::axislike::{AxisSignal, Zone};
    pub use crate::buttonlike::ButtonSignal;
    pub use crate::dual_axislike::DualAxisSignal;
    pub use crate::errors::{BindError, MutationError, NegativeThreshold, PayloadMismatch};
    pub use crate::event_source::{ActionSource, PayloadKind, SourceValue};
    pub use crate::frame_clock::{FrameClock, FrameStamp};
}
