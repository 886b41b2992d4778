//! Error types raised by the tracking core.
//!
//! None of these are fatal to a stream: the per-frame update collects them into
//! [`FrameReport::issues`](crate::FrameReport) and keeps going.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// Caller supplied a non-finite or inverted bounding box.
    #[error("invalid detection: {reason}")]
    InvalidDetection { reason: String },

    /// Frame interval was zero, negative or non-finite.
    #[error("degenerate timestep dt={dt}, substituted {substituted}")]
    DegenerateTimestep { dt: f32, substituted: f32 },

    /// The optimal assignment could not be computed for this frame.
    #[error("assignment failure: {0}")]
    AssignmentFailure(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TrackerError {
    pub(crate) fn invalid_detection(reason: impl Into<String>) -> Self {
        Self::InvalidDetection {
            reason: reason.into(),
        }
    }
}
