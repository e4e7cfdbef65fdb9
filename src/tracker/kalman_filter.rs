//! Motion filter contract and a constant-velocity Kalman filter over `(x, y, a, h)`.

use ndarray::{Array1, Array2};

use crate::tracker::error::{Result, TrackError};

/// Predictor/corrector maintaining a Gaussian belief over box geometry.
///
/// Implementations hold no per-track state, so a single filter can be shared
/// by every track of a tracker.
pub trait MotionFilter {
    /// Create the initial belief from an unassociated `(x, y, a, h)` measurement.
    fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>);

    /// Advance the belief by one time step without a measurement.
    fn predict(&self, mean: &Array1<f64>, covariance: &Array2<f64>)
    -> (Array1<f64>, Array2<f64>);

    /// Correct the belief with an `(x, y, a, h)` measurement.
    fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 4],
    ) -> Result<(Array1<f64>, Array2<f64>)>;
}

/// Kalman filter with an 8-dimensional state `(x, y, a, h, vx, vy, va, vh)`.
///
/// Motion follows a constant velocity model; the box location is observed
/// directly. Uncertainty is scaled by the current box height.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
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
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    /// Project the state distribution to measurement space.
    pub fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let h = mean[3];
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-1,
            self.std_weight_position * h,
        ];

        let innovation_cov = diagonal_squared(&std);

        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Invert a 4x4 matrix using nalgebra (pure Rust).
    fn invert_4x4(m: &Array2<f64>) -> Result<Array2<f64>> {
        let nm = nalgebra::Matrix4::from_fn(|i, j| m[[i, j]]);
        let inv = nm.try_inverse().ok_or(TrackError::SingularCovariance)?;
        Ok(Array2::from_shape_fn((4, 4), |(i, j)| inv[(i, j)]))
    }
}

impl MotionFilter for KalmanFilter {
    fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>) {
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

        (mean, diagonal_squared(&std))
    }

    fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let h = mean[3];
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

        let motion_cov = diagonal_squared(&std);

        let new_mean = self.motion_mat.dot(mean);
        let new_covariance = self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + motion_cov;

        (new_mean, new_covariance)
    }

    fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 4],
    ) -> Result<(Array1<f64>, Array2<f64>)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let innovation = Array1::from_vec(measurement.to_vec()) - projected_mean;

        // K = P * H^T * S^-1, where H = [I 0] so P * H^T is the first 4 columns of P.
        let s_inv = Self::invert_4x4(&projected_cov)?;

        let pht = covariance.dot(&self.update_mat.t()); // 8x4
        let kalman_gain = pht.dot(&s_inv); // 8x4

        let new_mean = mean + &kalman_gain.dot(&innovation);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        Ok((new_mean, new_covariance))
    }
}

fn diagonal_squared(std: &[f64]) -> Array2<f64> {
    Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s)))
}
