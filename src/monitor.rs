//! Frame orchestrator: validates detector output, drives the tracker and
//! aggregates per-class counts and speeding tracks.

use std::collections::{BTreeMap, HashSet};

use tracing::{trace, warn};

use crate::config::MonitorConfig;
use crate::error::TrackerError;
use crate::tracker::{Detection, Rect, SortTracker, SpeedEstimator};

/// Frame interval substituted for zero, negative or non-finite `dt`.
pub const MIN_TIMESTEP: f32 = 1e-3;

/// A confirmed track as reported for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackReport {
    pub track_id: u64,
    pub bbox: Rect,
    pub class_label: Option<String>,
    /// Scaled units per second.
    pub speed: f32,
    pub hits: u32,
    pub misses: u32,
    pub age: u32,
}

/// Everything the harness gets back for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// 1-based count of processed frames.
    pub frame_index: u64,
    /// Stream time in seconds, accumulated from `dt`.
    pub timestamp: f64,
    /// Confirmed live tracks, ascending by id.
    pub tracks: Vec<TrackReport>,
    /// Tracks in this frame faster than the speed limit.
    pub speeding_now: usize,
    /// Running count of distinct tracks per class label.
    pub class_counts: BTreeMap<String, usize>,
    /// Distinct tracks that have ever exceeded the speed limit.
    pub total_speeders: usize,
    pub issues: Vec<TrackerError>,
}

pub struct TrafficMonitor {
    config: MonitorConfig,
    tracker: SortTracker,
    speed: SpeedEstimator,
    clock: f64,
    frame_index: u64,
    class_counts: BTreeMap<String, usize>,
    // Live tracks already counted or flagged; pruned as tracks are deleted.
    counted: HashSet<u64>,
    speeders: HashSet<u64>,
    total_speeders: usize,
}

impl TrafficMonitor {
    pub fn new(config: MonitorConfig) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    pub fn with_default_config() -> Self {
        Self::from_validated(MonitorConfig::default())
    }

    fn from_validated(config: MonitorConfig) -> Self {
        Self {
            tracker: SortTracker::new(config.tracker.clone()),
            speed: SpeedEstimator::new(config.tracker.pixel_to_distance_scale),
            clock: 0.0,
            frame_index: 0,
            class_counts: seeded_counts(&config),
            counted: HashSet::new(),
            speeders: HashSet::new(),
            total_speeders: 0,
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn tracker(&self) -> &SortTracker {
        &self.tracker
    }

    pub fn class_counts(&self) -> &BTreeMap<String, usize> {
        &self.class_counts
    }

    pub fn total_speeders(&self) -> usize {
        self.total_speeders
    }

    /// Start over for a new stream. Track identities keep increasing.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.clock = 0.0;
        self.frame_index = 0;
        self.class_counts = seeded_counts(&self.config);
        self.counted.clear();
        self.speeders.clear();
        self.total_speeders = 0;
    }

    /// Process one frame; `dt` is the time in seconds since the previous call.
    pub fn update(&mut self, detections: Vec<Detection>, dt: f32) -> FrameReport {
        self.frame_index += 1;
        let mut issues = Vec::new();

        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            let err = TrackerError::DegenerateTimestep {
                dt,
                substituted: MIN_TIMESTEP,
            };
            warn!(frame = self.frame_index, error = %err, "clamping timestep");
            issues.push(err);
            MIN_TIMESTEP
        };
        self.clock += dt as f64;

        let mut valid = Vec::with_capacity(detections.len());
        for det in detections {
            match det.validate() {
                Ok(()) => valid.push(det),
                Err(err) => {
                    warn!(frame = self.frame_index, error = %err, "dropping detection");
                    issues.push(err);
                }
            }
        }

        let outcome = self.tracker.update(&valid, self.clock);
        issues.extend(outcome.issues);
        for id in &outcome.deleted {
            self.counted.remove(id);
            self.speeders.remove(id);
        }

        let tracks: Vec<TrackReport> = outcome
            .tracks
            .into_iter()
            .map(|t| TrackReport {
                speed: self.speed.estimate(&t.history),
                bbox: t.rect(),
                track_id: t.track_id,
                class_label: t.class_label,
                hits: t.hits,
                misses: t.misses,
                age: t.age,
            })
            .collect();

        for report in &tracks {
            self.count_class(report);
        }

        let speed_limit = self.config.speed_limit;
        let mut speeding_now = 0;
        for report in tracks.iter().filter(|r| r.speed > speed_limit) {
            speeding_now += 1;
            if self.speeders.insert(report.track_id) {
                self.total_speeders += 1;
            }
        }

        trace!(
            frame = self.frame_index,
            reported = tracks.len(),
            speeding_now,
            issues = issues.len(),
            "frame processed"
        );

        FrameReport {
            frame_index: self.frame_index,
            timestamp: self.clock,
            tracks,
            speeding_now,
            class_counts: self.class_counts.clone(),
            total_speeders: self.total_speeders,
            issues,
        }
    }

    /// Count a track once, under its sticky label, the first time it is
    /// reported with one.
    fn count_class(&mut self, report: &TrackReport) {
        let Some(label) = report.class_label.as_deref() else {
            return;
        };
        if !self.counted.insert(report.track_id) {
            return;
        }
        let allowed = match &self.config.counted_classes {
            Some(classes) => classes.iter().any(|c| c == label),
            None => true,
        };
        if allowed {
            *self.class_counts.entry(label.to_owned()).or_insert(0) += 1;
        }
    }
}

fn seeded_counts(config: &MonitorConfig) -> BTreeMap<String, usize> {
    config
        .counted_classes
        .iter()
        .flatten()
        .map(|c| (c.clone(), 0))
        .collect()
}
