//! Integration module for connecting object detection backends with the tracker.
//!
//! The tracking core never sees detector types: back-ends implement
//! [`DetectionSource`] and hand over plain [`Detection`](crate::Detection)s.

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::{FrameInput, TrackerPipeline};
