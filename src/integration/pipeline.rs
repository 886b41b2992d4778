//! TrackerPipeline for combining detection with tracking.

use std::thread;

use crossbeam_channel::bounded;
use tracing::{debug, warn};

use crate::monitor::{FrameReport, TrafficMonitor};
use crate::tracker::Detection;

use super::DetectionSource;

/// One decoded frame handed to the pipeline.
#[derive(Debug, Clone)]
pub struct FrameInput {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Seconds since the previous frame.
    pub dt: f32,
}

/// Bundles a detection backend with a [`TrafficMonitor`].
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    monitor: TrafficMonitor,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and monitor.
    pub fn new(detector: D, monitor: TrafficMonitor) -> Self {
        Self { detector, monitor }
    }

    /// Create a new tracking pipeline with default monitor configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, TrafficMonitor::with_default_config())
    }

    /// Detect and track a single frame, sequentially.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        dt: f32,
    ) -> Result<FrameReport, D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        Ok(self.monitor.update(detections, dt))
    }

    /// Run a whole stream, detecting frame N+1 while frame N is tracked.
    ///
    /// The detector runs on its own thread and hands results over a
    /// rendezvous channel, so each stage holds at most one frame. Tracking
    /// stays on the calling thread and sees frames in order. Stops at the
    /// first detector error. Returns the number of frames tracked.
    pub fn run_pipelined<I, F>(&mut self, frames: I, mut on_frame: F) -> Result<u64, D::Error>
    where
        D: Send,
        D::Error: Send,
        I: IntoIterator<Item = FrameInput>,
        I::IntoIter: Send,
        F: FnMut(FrameReport),
    {
        let frames = frames.into_iter();
        let detector = &mut self.detector;
        let monitor = &mut self.monitor;

        thread::scope(|s| {
            let (tx, rx) = bounded::<Result<(Vec<Detection>, f32), D::Error>>(0);

            let handle = s.spawn(move || {
                for frame in frames {
                    let result = detector
                        .detect(&frame.data, frame.width, frame.height)
                        .map(|dets| (dets, frame.dt));
                    let failed = result.is_err();
                    if tx.send(result).is_err() || failed {
                        break;
                    }
                }
            });

            let mut tracked = 0;
            let mut outcome = Ok(());
            for message in rx.iter() {
                match message {
                    Ok((detections, dt)) => {
                        on_frame(monitor.update(detections, dt));
                        tracked += 1;
                    }
                    Err(err) => {
                        warn!(frame = tracked + 1, "detector failed, stopping pipeline");
                        outcome = Err(err);
                        break;
                    }
                }
            }
            drop(rx);

            if let Err(panic) = handle.join() {
                std::panic::resume_unwind(panic);
            }
            debug!(tracked, "pipeline finished");
            outcome.map(|()| tracked)
        })
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying monitor.
    pub fn monitor(&self) -> &TrafficMonitor {
        &self.monitor
    }

    /// Get a mutable reference to the underlying monitor.
    pub fn monitor_mut(&mut self) -> &mut TrafficMonitor {
        &mut self.monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays one car box sliding right by 10px per frame; fails on `fail_at`.
    struct ScriptedDetector {
        frame: u32,
        fail_at: Option<u32>,
    }

    impl DetectionSource for ScriptedDetector {
        type Error = String;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Detection>, Self::Error> {
            self.frame += 1;
            if Some(self.frame) == self.fail_at {
                return Err(format!("decode error at frame {}", self.frame));
            }
            let x = 100.0 + 10.0 * (self.frame - 1) as f32;
            Ok(vec![Detection::new(x, 80.0, x + 40.0, 120.0, Some("car"))])
        }
    }

    fn frames(n: usize) -> Vec<FrameInput> {
        (0..n)
            .map(|_| FrameInput {
                data: vec![],
                width: 640,
                height: 480,
                dt: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_process_frame() {
        let detector = ScriptedDetector {
            frame: 0,
            fail_at: None,
        };
        let mut pipeline = TrackerPipeline::with_default_config(detector);

        let mut report = FrameReport::default();
        for _ in 0..3 {
            report = pipeline.process_frame(&[], 640, 480, 1.0).unwrap();
        }
        assert_eq!(report.tracks.len(), 1);
        assert!((report.tracks[0].speed - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_pipelined_matches_sequential() {
        let mut sequential = TrackerPipeline::with_default_config(ScriptedDetector {
            frame: 0,
            fail_at: None,
        });
        let expected: Vec<_> = (0..8)
            .map(|_| sequential.process_frame(&[], 640, 480, 1.0).unwrap())
            .map(|r| (r.frame_index, r.tracks))
            .collect();

        let mut pipelined = TrackerPipeline::with_default_config(ScriptedDetector {
            frame: 0,
            fail_at: None,
        });
        let mut got = Vec::new();
        let tracked = pipelined
            .run_pipelined(frames(8), |r| got.push((r.frame_index, r.tracks)))
            .unwrap();

        assert_eq!(tracked, 8);
        assert_eq!(got, expected);
    }

    #[test]
    fn test_pipelined_stops_on_detector_error() {
        let mut pipeline = TrackerPipeline::with_default_config(ScriptedDetector {
            frame: 0,
            fail_at: Some(4),
        });
        let mut seen = 0;
        let err = pipeline
            .run_pipelined(frames(10), |_| seen += 1)
            .unwrap_err();

        assert_eq!(err, "decode error at frame 4");
        assert_eq!(seen, 3);
        assert_eq!(pipeline.monitor().tracker().frame_count(), 3);
    }
}
