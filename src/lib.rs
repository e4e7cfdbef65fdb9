//! Lifecycle of a single tracked object in a DeepSORT-style
//! tracking-by-detection pipeline.
//!
//! A [`Track`] owns the motion belief of one object, its confirmation and
//! deletion policy, its appearance-feature history and its positional
//! trajectory. The set-level tracker that owns many tracks drives them
//! through [`Track::predict`], [`Track::update`] and [`Track::mark_missed`].

pub mod integration;
pub mod tracker;

pub use integration::DetectionBuilder;
pub use tracker::{
    DEFAULT_SAMPLING_RATE, Detection, KalmanFilter, MotionFilter, Rect, Result, Track,
    TrackConfig, TrackError, TrackIdAllocator, TrackState, Velocity,
};
