mod detection;
mod kalman_filter;
mod matching;
mod rect;
mod sort_tracker;
mod speed;
mod track;
mod track_state;

pub use detection::Detection;
pub use kalman_filter::{KalmanFilter, MIN_BOX_SIDE};
pub use matching::{AssignmentResult, associate, greedy_assignment, iou_distance, linear_assignment};
pub use rect::Rect;
pub use sort_tracker::{SortTracker, TrackerUpdate};
pub use speed::{SpeedEstimator, SpeedHistory, SpeedSample};
pub use track::Track;
pub use track_state::TrackState;
