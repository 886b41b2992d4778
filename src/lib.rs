//! Multi-object tracking with speed estimation for traffic-camera detections.
//!
//! Per frame, detections are matched to Kalman-predicted tracks by optimal IoU
//! assignment; tracks are confirmed, coasted and retired by hit/miss counters,
//! and each confirmed track's speed is measured over a sliding window of its
//! observed centers.
//!
//! ```
//! use speedtrack_rs::{Detection, MonitorConfig, TrafficMonitor};
//!
//! let mut monitor = TrafficMonitor::new(MonitorConfig::default()).unwrap();
//! for i in 0..3 {
//!     let x = 100.0 + 10.0 * i as f32;
//!     let report = monitor.update(vec![Detection::new(x, 80.0, x + 40.0, 120.0, Some("car"))], 1.0);
//!     if i == 2 {
//!         assert_eq!(report.tracks.len(), 1);
//!         assert!((report.tracks[0].speed - 10.0).abs() < 1e-4);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod integration;
pub mod monitor;
pub mod tracker;

pub use config::{MonitorConfig, MotionNoise, TrackerConfig};
pub use error::TrackerError;
pub use integration::{DetectionBuilder, DetectionSource, FrameInput, IntoDetections, TrackerPipeline};
pub use monitor::{FrameReport, TrackReport, TrafficMonitor};
pub use tracker::{Detection, Rect, SortTracker, Track, TrackState};
