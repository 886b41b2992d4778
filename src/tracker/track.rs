//! Single object track for multi-object tracking.

use nalgebra as na;
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::tracker::detection::Detection;
use crate::tracker::kalman_filter::{KalmanFilter, MIN_BOX_SIDE};
use crate::tracker::rect::Rect;
use crate::tracker::speed::SpeedHistory;
use crate::tracker::track_state::TrackState;

/// Single object track.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track identifier
    pub track_id: u64,
    /// Current track state
    pub state: TrackState,
    /// Consecutive frames matched
    pub hits: u32,
    /// Consecutive frames unmatched
    pub misses: u32,
    /// Frames since creation
    pub age: u32,
    /// First label seen for this track
    pub class_label: Option<String>,
    /// Kalman filter state mean (8-dim XYAH + velocities)
    pub mean: Array1<f64>,
    /// Kalman filter state covariance (8x8)
    pub covariance: Array2<f64>,
    /// Observed centers used for speed estimation
    pub history: SpeedHistory,
}

impl Track {
    /// Start a tentative track from an unmatched detection.
    pub fn new(
        track_id: u64,
        det: &Detection,
        kalman_filter: &KalmanFilter,
        history_window: usize,
        timestamp: f64,
    ) -> Self {
        let (mean, covariance) = kalman_filter.initiate(measurement(&det.bbox));
        let mut history = SpeedHistory::with_capacity(history_window);
        history.push(center(&det.bbox), timestamp);

        Self {
            track_id,
            state: TrackState::Tentative,
            hits: 1,
            misses: 0,
            age: 1,
            class_label: det.class_label.clone(),
            mean,
            covariance,
            history,
        }
    }

    /// Current bounding box from the filter state.
    pub fn rect(&self) -> Rect {
        Rect::from_xyah(
            self.mean[0] as f32,
            self.mean[1] as f32,
            self.mean[2] as f32,
            self.mean[3] as f32,
        )
    }

    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// Advance the filter one frame. Coasting tracks have their velocity damped first.
    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        let mut mean_to_predict = self.mean.clone();
        if self.misses > 0 {
            kalman_filter.damp_velocity(&mut mean_to_predict);
        }
        let (new_mean, new_cov) = kalman_filter.predict(&mean_to_predict, &self.covariance);
        self.mean = new_mean;
        self.covariance = new_cov;
    }

    /// Apply a matched detection observed at `timestamp`.
    pub fn update(
        &mut self,
        det: &Detection,
        kalman_filter: &KalmanFilter,
        timestamp: f64,
        confirmation_hits: u32,
    ) {
        let z = measurement(&det.bbox);
        match kalman_filter.update(&self.mean, &self.covariance, z) {
            Some((mean, cov)) => {
                self.mean = mean;
                self.covariance = cov;
            }
            None => {
                debug!(track_id = self.track_id, "kalman correction failed, re-seeding from detection");
                let (mean, cov) = kalman_filter.initiate(z);
                self.mean = mean;
                self.covariance = cov;
            }
        }

        self.hits += 1;
        self.misses = 0;
        self.age += 1;
        if self.class_label.is_none() {
            self.class_label = det.class_label.clone();
        }
        self.history.push(center(&det.bbox), timestamp);
        self.promote_if_ready(confirmation_hits);
    }

    /// Record a frame with no matching detection.
    pub fn mark_missed(&mut self) {
        self.hits = 0;
        self.misses += 1;
        self.age += 1;
    }

    pub fn mark_deleted(&mut self) {
        self.state = TrackState::Deleted;
    }

    pub(crate) fn promote_if_ready(&mut self, confirmation_hits: u32) {
        if self.state == TrackState::Tentative && self.hits >= confirmation_hits {
            self.state = TrackState::Confirmed;
            debug!(track_id = self.track_id, class = ?self.class_label, "track confirmed");
        }
    }

    pub fn multi_predict(tracks: &mut [Track], kalman_filter: &KalmanFilter) {
        for track in tracks.iter_mut() {
            track.predict(kalman_filter);
        }
    }
}

fn measurement(bbox: &Rect) -> [f64; 4] {
    bbox.to_xyah_clamped(MIN_BOX_SIDE as f32).map(f64::from)
}

fn center(bbox: &Rect) -> na::Point2<f32> {
    let (cx, cy) = bbox.center();
    na::Point2::new(cx, cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, label: Option<&str>) -> Detection {
        Detection::new(x1, y1, x2, y2, label)
    }

    #[test]
    fn test_new_track_counters() {
        let kf = KalmanFilter::default();
        let track = Track::new(7, &det(0.0, 0.0, 20.0, 40.0, Some("car")), &kf, 10, 0.0);
        assert_eq!(track.track_id, 7);
        assert_eq!(track.state, TrackState::Tentative);
        assert_eq!((track.hits, track.misses, track.age), (1, 0, 1));
        assert_eq!(track.history.len(), 1);

        let rect = track.rect();
        assert!((rect.width - 20.0).abs() < 1e-4);
        assert!((rect.height - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_update_counters_and_sticky_label() {
        let kf = KalmanFilter::default();
        let mut track = Track::new(1, &det(0.0, 0.0, 20.0, 40.0, None), &kf, 10, 0.0);
        track.mark_missed();
        assert_eq!((track.hits, track.misses, track.age), (0, 1, 2));

        track.predict(&kf);
        track.update(&det(1.0, 0.0, 21.0, 40.0, Some("truck")), &kf, 1.0, 3);
        assert_eq!((track.hits, track.misses, track.age), (1, 0, 3));
        assert_eq!(track.class_label.as_deref(), Some("truck"));

        track.predict(&kf);
        track.update(&det(2.0, 0.0, 22.0, 40.0, Some("car")), &kf, 2.0, 3);
        assert_eq!(track.class_label.as_deref(), Some("truck"));
        assert_eq!(track.history.len(), 3);
    }

    #[test]
    fn test_confirmation_is_one_way() {
        let kf = KalmanFilter::default();
        let mut track = Track::new(1, &det(0.0, 0.0, 20.0, 40.0, None), &kf, 10, 0.0);
        for t in 1..3 {
            track.predict(&kf);
            track.update(&det(0.0, 0.0, 20.0, 40.0, None), &kf, t as f64, 3);
        }
        assert!(track.is_confirmed());

        track.mark_missed();
        track.mark_missed();
        assert!(track.is_confirmed());
    }
}
