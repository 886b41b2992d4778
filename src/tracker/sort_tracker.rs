//! Track manager: owns the live track set and its lifecycle.

use tracing::{debug, trace, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::tracker::detection::Detection;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching;
use crate::tracker::rect::Rect;
use crate::tracker::track::Track;

/// Outcome of one [`SortTracker::update`] call.
#[derive(Debug, Clone, Default)]
pub struct TrackerUpdate {
    /// Confirmed live tracks, ascending by id.
    pub tracks: Vec<Track>,
    /// Identities retired this frame.
    pub deleted: Vec<u64>,
    /// Recoverable problems met while processing the frame.
    pub issues: Vec<TrackerError>,
}

pub struct SortTracker {
    tracks: Vec<Track>,
    next_id: u64,
    frame_count: u64,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
}

impl SortTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            frame_count: 0,
            kalman_filter: KalmanFilter::new(&config.motion),
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// All live tracks, tentative ones included, in creation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Drop every live track. Identities handed out so far stay retired.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.frame_count = 0;
    }

    /// Process one frame of detections observed at stream time `timestamp`.
    pub fn update(&mut self, detections: &[Detection], timestamp: f64) -> TrackerUpdate {
        self.frame_count += 1;
        let mut issues = Vec::new();

        // Step 1: Keep only detections that are safe to feed the filter
        let detections: Vec<&Detection> = detections
            .iter()
            .filter(|det| match det.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "dropping detection");
                    issues.push(err);
                    false
                }
            })
            .collect();

        // Step 2: Predict every track into the current frame
        Track::multi_predict(&mut self.tracks, &self.kalman_filter);

        // Step 3: Associate predictions with detections
        let track_rects: Vec<Rect> = self.tracks.iter().map(|t| t.rect()).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let dists = matching::iou_distance(&track_rects, &det_rects);

        let (assignment, failure) =
            matching::associate(&dists, 1.0 - self.config.iou_match_threshold);
        issues.extend(failure);

        for &(itracked, idet) in &assignment.matches {
            self.tracks[itracked].update(
                detections[idet],
                &self.kalman_filter,
                timestamp,
                self.config.confirmation_hits,
            );
        }
        for &itracked in &assignment.unmatched_tracks {
            self.tracks[itracked].mark_missed();
        }

        // Step 4: Retire tracks that have coasted too long
        let max_age = self.config.max_age_misses;
        let mut deleted = Vec::new();
        self.tracks.retain_mut(|track| {
            if track.misses > max_age {
                track.mark_deleted();
                debug!(track_id = track.track_id, age = track.age, "track deleted");
                deleted.push(track.track_id);
                false
            } else {
                true
            }
        });

        // Step 5: Init new tracks from leftover detections
        for &idet in &assignment.unmatched_detections {
            let track_id = self.next_id;
            self.next_id += 1;

            let mut track = Track::new(
                track_id,
                detections[idet],
                &self.kalman_filter,
                self.config.history_window,
                timestamp,
            );
            track.promote_if_ready(self.config.confirmation_hits);
            debug!(track_id, class = ?track.class_label, "track created");
            self.tracks.push(track);
        }

        trace!(
            frame = self.frame_count,
            live = self.tracks.len(),
            matched = assignment.matches.len(),
            created = assignment.unmatched_detections.len(),
            deleted = deleted.len(),
            "tracker updated"
        );

        TrackerUpdate {
            tracks: self
                .tracks
                .iter()
                .filter(|t| t.is_confirmed())
                .cloned()
                .collect(),
            deleted,
            issues,
        }
    }
}
