//! Constant-velocity Kalman filter over XYAH boxes, using ndarray for the state
//! and nalgebra for the 4x4 inverse.
//!
//! State is `[cx, cy, a, h, vx, vy, va, vh]`; velocities are per frame.

use ndarray::{Array1, Array2};

use crate::config::MotionNoise;

/// Smallest box side, in pixels, the filter will carry.
pub const MIN_BOX_SIDE: f64 = 1.0;
const MIN_ASPECT: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
    velocity_decay: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(&MotionNoise::default())
    }
}

impl KalmanFilter {
    pub fn new(noise: &MotionNoise) -> Self {
        let ndim = 4;
        let mut motion_mat = Array2::eye(2 * ndim);
        for i in 0..ndim {
            motion_mat[[i, ndim + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((ndim, 2 * ndim));
        for i in 0..ndim {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: noise.std_weight_position,
            std_weight_velocity: noise.std_weight_velocity,
            velocity_decay: noise.velocity_decay,
        }
    }

    pub fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>) {
        let measurement = clamp_measurement(measurement);
        let mut mean = Array1::zeros(8);
        for i in 0..4 {
            mean[i] = measurement[i];
        }

        let h = measurement[3];
        let std = [
            2.0 * self.std_weight_position * h,
            2.0 * self.std_weight_position * h,
            1e-2,
            2.0 * self.std_weight_position * h,
            10.0 * self.std_weight_velocity * h,
            10.0 * self.std_weight_velocity * h,
            1e-5,
            10.0 * self.std_weight_velocity * h,
        ];

        (mean, diag(&std))
    }

    /// Extrapolate one frame ahead.
    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let h = mean[3].max(MIN_BOX_SIDE);
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-2,
            self.std_weight_position * h,
            self.std_weight_velocity * h,
            self.std_weight_velocity * h,
            1e-5,
            self.std_weight_velocity * h,
        ];

        let mut new_mean = self.motion_mat.dot(mean);
        clamp_state(&mut new_mean);
        let new_covariance =
            self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + diag(&std);

        (new_mean, new_covariance)
    }

    /// Shrink the velocity of a coasting track and freeze its size.
    pub fn damp_velocity(&self, mean: &mut Array1<f64>) {
        mean[4] *= self.velocity_decay;
        mean[5] *= self.velocity_decay;
        mean[6] = 0.0;
        mean[7] = 0.0;
    }

    pub fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let h = mean[3].max(MIN_BOX_SIDE);
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-1,
            self.std_weight_position * h,
        ];

        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + diag(&std);

        (mean_proj, covariance_proj)
    }

    /// Correct the state with an observed box.
    ///
    /// Returns `None` when the innovation covariance is singular or the
    /// corrected state is not finite; the caller re-seeds from the measurement.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 4],
    ) -> Option<(Array1<f64>, Array2<f64>)> {
        let measurement = clamp_measurement(measurement);
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let measurement_arr = Array1::from_vec(measurement.to_vec());
        let innovation = measurement_arr - projected_mean;

        // K = P * H^T * S^-1, with H = [I 0] and S the projected covariance.
        let s_inv = invert_4x4(&projected_cov)?;

        let pht = covariance.dot(&self.update_mat.t()); // 8x4
        let kalman_gain = pht.dot(&s_inv); // 8x4

        let mut new_mean = mean + &kalman_gain.dot(&innovation);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        if !new_mean.iter().chain(new_covariance.iter()).all(|v| v.is_finite()) {
            return None;
        }
        clamp_state(&mut new_mean);

        Some((new_mean, new_covariance))
    }
}

fn diag(std: &[f64]) -> Array2<f64> {
    let mut m = Array2::zeros((std.len(), std.len()));
    for (i, s) in std.iter().enumerate() {
        m[[i, i]] = s * s;
    }
    m
}

fn clamp_measurement(mut measurement: [f64; 4]) -> [f64; 4] {
    measurement[2] = measurement[2].max(MIN_ASPECT);
    measurement[3] = measurement[3].max(MIN_BOX_SIDE);
    measurement
}

fn clamp_state(mean: &mut Array1<f64>) {
    mean[2] = mean[2].max(MIN_ASPECT);
    mean[3] = mean[3].max(MIN_BOX_SIDE);
}

/// Invert a 4x4 matrix using nalgebra (pure Rust).
fn invert_4x4(m: &Array2<f64>) -> Option<Array2<f64>> {
    let mut nm = nalgebra::Matrix4::zeros();
    for i in 0..4 {
        for j in 0..4 {
            nm[(i, j)] = m[[i, j]];
        }
    }
    let inv = nm.try_inverse()?;
    let mut res = Array2::zeros((4, 4));
    for i in 0..4 {
        for j in 0..4 {
            res[[i, j]] = inv[(i, j)];
        }
    }
    Some(res)
}
