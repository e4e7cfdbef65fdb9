//! Velocity and slope derived from a trajectory of center points.

use ndarray::{Array2, Axis, s};

/// Sampling rate assumed when the caller has no better frame rate.
pub const DEFAULT_SAMPLING_RATE: f64 = 5.0;

const DIRECTION_EPSILON: f64 = 1e-8;
const SLOPE_EPSILON: f64 = 1e-7;

/// Per-step velocity summary of a trajectory with `n` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Velocity {
    /// Mean speed over all steps
    pub average: f64,
    /// Speed of each step, shape `(n - 1, 1)`
    pub magnitudes: Array2<f64>,
    /// Unit direction of each step, shape `(n - 1, 2)`
    pub directions: Array2<f64>,
}

fn trajectory_array(trajectory: &[[f32; 2]]) -> Array2<f64> {
    Array2::from_shape_fn((trajectory.len(), 2), |(i, j)| f64::from(trajectory[i][j]))
}

/// Velocity of every step between consecutive points, scaled by `sampling_rate`.
///
/// Returns `None` for trajectories with fewer than two points.
pub fn velocity(trajectory: &[[f32; 2]], sampling_rate: f64) -> Option<Velocity> {
    if trajectory.len() < 2 {
        return None;
    }

    let points = trajectory_array(trajectory);
    let n = points.nrows();
    let steps = (&points.slice(s![1.., ..]) - &points.slice(s![..n - 1, ..])) * sampling_rate;

    let magnitudes = steps
        .map_axis(Axis(1), |step| step.iter().map(|c| c * c).sum::<f64>().sqrt())
        .insert_axis(Axis(1));
    // Zero-length steps get a zero direction rather than NaN.
    let directions = &steps / &(&magnitudes + DIRECTION_EPSILON);
    let average = magnitudes.mean()?;

    Some(Velocity {
        average,
        magnitudes,
        directions,
    })
}

/// Slope between the first and last trajectory points.
///
/// Not a regression: intermediate points are ignored. A vertical trajectory
/// yields a large but finite slope.
pub fn trajectory_slope(trajectory: &[[f32; 2]]) -> Option<f64> {
    if trajectory.len() < 2 {
        return None;
    }
    let first = trajectory.first()?;
    let last = trajectory.last()?;

    let diff_y = f64::from(last[1]) - f64::from(first[1]);
    let diff_x = f64::from(last[0]) - f64::from(first[0]) + SLOPE_EPSILON;
    Some(diff_y / diff_x)
}
