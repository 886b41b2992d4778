//! Configuration for the tracker and the frame orchestrator.

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Noise constants of the constant-velocity motion model.
///
/// Standard deviations are expressed relative to the box height, so the same
/// constants work for near and far vehicles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionNoise {
    /// Position noise as a fraction of box height.
    pub std_weight_position: f64,
    /// Velocity noise as a fraction of box height.
    pub std_weight_velocity: f64,
    /// Factor applied to the velocity estimate for every frame a track coasts.
    pub velocity_decay: f64,
}

impl Default for MotionNoise {
    fn default() -> Self {
        Self {
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
            velocity_decay: 0.9,
        }
    }
}

impl MotionNoise {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(self.std_weight_position.is_finite() && self.std_weight_position > 0.0) {
            return Err(TrackerError::InvalidConfig(format!(
                "std_weight_position must be positive, got {}",
                self.std_weight_position
            )));
        }
        if !(self.std_weight_velocity.is_finite() && self.std_weight_velocity > 0.0) {
            return Err(TrackerError::InvalidConfig(format!(
                "std_weight_velocity must be positive, got {}",
                self.std_weight_velocity
            )));
        }
        if !(self.velocity_decay > 0.0 && self.velocity_decay <= 1.0) {
            return Err(TrackerError::InvalidConfig(format!(
                "velocity_decay must be in (0, 1], got {}",
                self.velocity_decay
            )));
        }
        Ok(())
    }
}

/// Configuration for the [`SortTracker`](crate::SortTracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum IoU for a track/detection pair to count as a match.
    pub iou_match_threshold: f32,
    /// Consecutive hits needed to promote a track to confirmed.
    pub confirmation_hits: u32,
    /// A track is deleted once its consecutive misses exceed this.
    pub max_age_misses: u32,
    /// Number of center samples kept per track for speed estimation.
    pub history_window: usize,
    /// Real-world distance covered by one pixel.
    pub pixel_to_distance_scale: f32,
    pub motion: MotionNoise,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_match_threshold: 0.3,
            confirmation_hits: 3,
            max_age_misses: 5,
            history_window: 10,
            pixel_to_distance_scale: 1.0,
            motion: MotionNoise::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(0.0..=1.0).contains(&self.iou_match_threshold) {
            return Err(TrackerError::InvalidConfig(format!(
                "iou_match_threshold must be in [0, 1], got {}",
                self.iou_match_threshold
            )));
        }
        if self.confirmation_hits == 0 {
            return Err(TrackerError::InvalidConfig(
                "confirmation_hits must be at least 1".into(),
            ));
        }
        if self.history_window < 2 {
            return Err(TrackerError::InvalidConfig(format!(
                "history_window must hold at least 2 samples, got {}",
                self.history_window
            )));
        }
        if !(self.pixel_to_distance_scale.is_finite() && self.pixel_to_distance_scale > 0.0) {
            return Err(TrackerError::InvalidConfig(format!(
                "pixel_to_distance_scale must be positive, got {}",
                self.pixel_to_distance_scale
            )));
        }
        self.motion.validate()
    }
}

/// Configuration for the [`TrafficMonitor`](crate::TrafficMonitor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(flatten)]
    pub tracker: TrackerConfig,
    /// Tracks faster than this (in scaled units per second) count as speeding.
    pub speed_limit: f32,
    /// Restrict class counting to these labels. `None` counts every label.
    pub counted_classes: Option<Vec<String>>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            speed_limit: 30.0,
            counted_classes: None,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(self.speed_limit.is_finite() && self.speed_limit >= 0.0) {
            return Err(TrackerError::InvalidConfig(format!(
                "speed_limit must be a non-negative number, got {}",
                self.speed_limit
            )));
        }
        self.tracker.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tracker.iou_match_threshold, 0.3);
        assert_eq!(config.tracker.confirmation_hits, 3);
        assert_eq!(config.tracker.max_age_misses, 5);
        assert_eq!(config.tracker.history_window, 10);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"pixel_to_distance_scale": 0.05, "speed_limit": 50.0}"#)
                .unwrap();
        assert_eq!(config.tracker.pixel_to_distance_scale, 0.05);
        assert_eq!(config.speed_limit, 50.0);
        assert_eq!(config.tracker.max_age_misses, 5);
        assert!(config.counted_classes.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = TrackerConfig::default();
        config.iou_match_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(TrackerError::InvalidConfig(_))
        ));

        let mut config = TrackerConfig::default();
        config.history_window = 1;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.pixel_to_distance_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.motion.velocity_decay = 0.0;
        assert!(config.validate().is_err());
    }
}
