use thiserror::Error;

pub type Result<T, E = TrackError> = std::result::Result<T, E>;

/// Errors raised when a collaborator breaks the track's input contract.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    /// Lifecycle thresholds that cannot drive a track.
    #[error("invalid track configuration: {0}")]
    InvalidConfig(String),
    /// A state vector, covariance or feature with the wrong shape.
    #[error("{what} has dimension {got}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// The projected innovation covariance could not be inverted.
    #[error("innovation covariance is singular")]
    SingularCovariance,
}
