/// Axis-aligned box in pixel coordinates, stored as top-left corner plus size.
///
/// Detectors hand boxes over as corners (TLBR); the motion model works on
/// center, aspect ratio and height (XYAH).
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// From corners. An inverted pair yields a negative size, which
    /// [`Detection::validate`](crate::Detection::validate) rejects.
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// From center, aspect ratio (w/h) and height.
    #[inline]
    pub fn from_xyah(cx: f32, cy: f32, aspect_ratio: f32, height: f32) -> Self {
        let width = aspect_ratio * height;
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Corners as `[x1, y1, x2, y2]`.
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.right(), self.bottom()]
    }

    /// XYAH with width and height raised to at least `min_side`, so a
    /// zero-area box still has a usable aspect ratio and height.
    pub fn to_xyah_clamped(&self, min_side: f32) -> [f32; 4] {
        let (cx, cy) = self.center();
        let width = self.width.max(min_side);
        let height = self.height.max(min_side);
        [cx, cy, width / height, height]
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.to_tlbr().iter().all(|v| v.is_finite())
    }

    /// Area shared with `other`; zero when the boxes are disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let overlap_w = self.right().min(other.right()) - self.x.max(other.x);
        let overlap_h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        overlap_w.max(0.0) * overlap_h.max(0.0)
    }

    /// Intersection over union, in `[0, 1]`. Two zero-area boxes score 0.
    pub fn iou(&self, other: &Rect) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union > 0.0 { inter / union } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_xyah_round_trip() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        let [cx, cy, a, h] = rect.to_xyah_clamped(1.0);
        assert_eq!((cx, cy), (25.0, 40.0));
        assert!((a - 0.75).abs() < 1e-6);

        let back = Rect::from_xyah(cx, cy, a, h);
        assert!((back.x - 10.0).abs() < 1e-5);
        assert!((back.width - 30.0).abs() < 1e-5);
    }

    #[test]
    fn test_xyah_clamps_degenerate_box() {
        let rect = Rect::from_tlbr(50.0, 50.0, 50.0, 50.0);
        let [cx, cy, a, h] = rect.to_xyah_clamped(1.0);
        assert_eq!((cx, cy), (50.0, 50.0));
        assert_eq!(a, 1.0);
        assert_eq!(h, 1.0);
    }

    #[test]
    fn test_partial_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection_area(&b), 25.0);
        // 25 / (100 + 100 - 25)
        assert!((a.iou(&b) - 1.0 / 7.0).abs() < 1e-6);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn test_disjoint_and_identical() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let far = Rect::new(20.0, 20.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert_eq!(a.iou(&far), 0.0);
        assert_eq!(a.iou(&touching), 0.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_zero_area_boxes() {
        let a = Rect::new(5.0, 5.0, 0.0, 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }
}
