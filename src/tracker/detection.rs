//! Per-frame detection input for the tracker.

use crate::error::TrackerError;
use crate::tracker::rect::Rect;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box, built from TLBR input (x1, y1, x2, y2)
    pub bbox: Rect,
    /// Class label reported by the detector, if any
    pub class_label: Option<String>,
}

impl Detection {
    /// Build a detection without checking its geometry.
    ///
    /// The tracker validates every detection before it touches track state, so
    /// malformed input is reported rather than trusted.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, class_label: Option<&str>) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            class_label: class_label.map(str::to_owned),
        }
    }

    /// Build a detection, rejecting non-finite or inverted coordinates.
    pub fn try_new(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        class_label: Option<&str>,
    ) -> Result<Self, TrackerError> {
        let det = Self::new(x1, y1, x2, y2, class_label);
        det.validate()?;
        Ok(det)
    }

    pub fn from_rect(bbox: Rect, class_label: Option<String>) -> Self {
        Self { bbox, class_label }
    }

    /// Check the box is finite and not inverted.
    ///
    /// Zero-width or zero-height boxes pass; the motion model clamps them.
    pub fn validate(&self) -> Result<(), TrackerError> {
        let [x1, y1, x2, y2] = self.bbox.to_tlbr();
        if !self.bbox.is_finite() {
            return Err(TrackerError::invalid_detection(format!(
                "non-finite box [{x1}, {y1}, {x2}, {y2}]"
            )));
        }
        if self.bbox.width < 0.0 || self.bbox.height < 0.0 {
            return Err(TrackerError::invalid_detection(format!(
                "inverted box [{x1}, {y1}, {x2}, {y2}]"
            )));
        }
        Ok(())
    }
}
