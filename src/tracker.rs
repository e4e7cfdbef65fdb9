mod config;
mod detection;
mod error;
mod kalman_filter;
mod kinematics;
mod rect;
mod track;
mod track_id;
mod track_state;

pub use config::TrackConfig;
pub use detection::Detection;
pub use error::{Result, TrackError};
pub use kalman_filter::{KalmanFilter, MotionFilter};
pub use kinematics::{DEFAULT_SAMPLING_RATE, Velocity, trajectory_slope, velocity};
pub use rect::Rect;
pub use track::Track;
pub use track_id::TrackIdAllocator;
pub use track_state::TrackState;
