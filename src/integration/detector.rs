//! Seam between detector back-ends and the tracker.

use crate::tracker::{Detection, Rect};

/// A detector back-end the pipeline can drive.
///
/// Back-ends are interchangeable: the tracker only sees the returned
/// [`Detection`]s, never model or video types.
///
/// ```ignore
/// use speedtrack_rs::{Detection, DetectionSource};
///
/// struct FixedDetector;
///
/// impl DetectionSource for FixedDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, _input: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![Detection::new(10.0, 20.0, 50.0, 80.0, Some("car"))])
///     }
/// }
/// ```
pub trait DetectionSource {
    type Error;

    /// Detect objects in one frame of `width` x `height` pixels. The layout of
    /// `input` is up to the implementation.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Normalizes a back-end's raw output into tracker detections.
///
/// No validation happens here; bad boxes are reported by the tracker.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// TLBR boxes paired with optional labels.
impl IntoDetections for Vec<([f32; 4], Option<String>)> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|([x1, y1, x2, y2], label)| {
                Detection::from_rect(Rect::from_tlbr(x1, y1, x2, y2), label)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_tuples_into_detections() {
        let raw = vec![
            ([10.0, 20.0, 50.0, 80.0], Some("car".to_string())),
            ([0.0, 0.0, 5.0, 5.0], None),
        ];
        let dets = raw.into_detections();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].bbox, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(dets[0].class_label.as_deref(), Some("car"));
        assert!(dets[1].class_label.is_none());
    }
}
