//! Lifecycle thresholds shared by every track of a tracker.

use crate::tracker::error::{Result, TrackError};

/// Configuration for track confirmation and deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackConfig {
    /// Number of hits (construction included) before a track is confirmed
    pub n_init: u32,
    /// Maximum consecutive misses tolerated by a confirmed track
    pub max_age: u32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            n_init: 3,
            max_age: 30,
        }
    }
}

impl TrackConfig {
    pub fn new(n_init: u32, max_age: u32) -> Self {
        Self { n_init, max_age }
    }

    /// Reject thresholds that cannot drive a track.
    pub fn validate(&self) -> Result<()> {
        if self.n_init == 0 {
            return Err(TrackError::InvalidConfig(
                "n_init must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
