//! Builder for creating Detection objects from various input formats.

use crate::error::TrackerError;
use crate::tracker::{Detection, Rect};

/// Builder for creating `Detection` objects from various input formats.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    class_label: Option<String>,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.x2 = x + w;
        self.y2 = y + h;
        self
    }

    /// Set the class label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.class_label = Some(label.into());
        self
    }

    /// Build the final `Detection`, rejecting non-finite or inverted boxes.
    pub fn build(self) -> Result<Detection, TrackerError> {
        let det = Detection::from_rect(
            Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2),
            self.class_label,
        );
        det.validate()?;
        Ok(det)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .tlbr(10.0, 20.0, 50.0, 80.0)
            .label("truck")
            .build()
            .unwrap();

        assert_eq!(det.bbox, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(det.class_label.as_deref(), Some("truck"));
    }

    #[test]
    fn test_formats_agree() {
        let a = DetectionBuilder::new().xywh(30.0, 50.0, 40.0, 60.0).build().unwrap();
        let b = DetectionBuilder::new().tlwh(10.0, 20.0, 40.0, 60.0).build().unwrap();
        assert_eq!(a.bbox, b.bbox);
    }

    #[test]
    fn test_builder_rejects_inverted_box() {
        let err = DetectionBuilder::new().tlwh(10.0, 20.0, -5.0, 60.0).build();
        assert!(matches!(err, Err(TrackerError::InvalidDetection { .. })));
    }
}
