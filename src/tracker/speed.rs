//! Windowed speed estimation from a track's recent center positions.

use std::collections::VecDeque;

use nalgebra as na;

/// Elapsed time, in seconds, below which a window is too short to divide by.
const MIN_ELAPSED_SECS: f64 = 1e-6;

/// One observed center position and the stream time it was seen at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub position: na::Point2<f32>,
    pub timestamp: f64,
}

/// Bounded sliding window of speed samples, oldest first.
#[derive(Debug, Clone)]
pub struct SpeedHistory {
    samples: VecDeque<SpeedSample>,
    capacity: usize,
}

impl SpeedHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, position: na::Point2<f32>, timestamp: f64) -> Option<SpeedSample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(SpeedSample {
            position,
            timestamp,
        });
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn oldest(&self) -> Option<&SpeedSample> {
        self.samples.front()
    }

    #[inline]
    pub fn newest(&self) -> Option<&SpeedSample> {
        self.samples.back()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SpeedSample> {
        self.samples.iter()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.samples.clear()
    }

    /// Pixel displacement per second between the window's endpoints.
    ///
    /// Returns `None` with fewer than two samples or a near-zero elapsed time.
    pub fn pixel_velocity(&self) -> Option<f32> {
        if self.samples.len() < 2 {
            return None;
        }
        let first = self.oldest()?;
        let last = self.newest()?;

        let dt = last.timestamp - first.timestamp;
        if dt.is_nan() || dt <= MIN_ELAPSED_SECS {
            return None;
        }

        let dl = na::distance(&first.position, &last.position) as f64;
        Some((dl / dt) as f32)
    }
}

/// Converts a track's position history into a physical speed.
#[derive(Debug, Clone, Copy)]
pub struct SpeedEstimator {
    pixel_to_distance_scale: f32,
}

impl SpeedEstimator {
    pub fn new(pixel_to_distance_scale: f32) -> Self {
        Self {
            pixel_to_distance_scale,
        }
    }

    /// Smoothed speed in scaled units per second; zero when it can't be measured.
    pub fn estimate(&self, history: &SpeedHistory) -> f32 {
        match history.pixel_velocity() {
            Some(v) if v.is_finite() => (v * self.pixel_to_distance_scale).max(0.0),
            _ => 0.0,
        }
    }

    /// Record an observation and return the updated speed.
    pub fn observe(
        &self,
        history: &mut SpeedHistory,
        center: na::Point2<f32>,
        timestamp: f64,
    ) -> f32 {
        history.push(center, timestamp);
        self.estimate(history)
    }
}
