//! Helpers for turning raw detector outputs into tracker inputs.

mod builder;

pub use builder::DetectionBuilder;
