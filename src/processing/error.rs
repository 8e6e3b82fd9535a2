//! Errors raised while reading or writing tour files

use std::path::PathBuf;

/// Failure reading or writing a waypoint, point-set or solution file
#[derive(Debug, thiserror::Error)]
pub enum TourFileError {
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable waypoints in '{}'", path.display())]
    NoWaypoints { path: PathBuf },
    #[error("solution is empty, expected a point count")]
    MissingCount,
    #[error("solution point count '{token}' is not a number")]
    InvalidCount { token: String },
    #[error("solution covers {found} points, expected {expected}")]
    CountMismatch { expected: usize, found: usize },
    #[error("solution lists {found} indices, expected {expected}")]
    TooFewIndices { expected: usize, found: usize },
    #[error("solution index '{token}' is not a number")]
    InvalidIndex { token: String },
    #[error("solution index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("solution visits index {index} more than once")]
    DuplicateIndex { index: usize },
}

impl TourFileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TourFileError::Io {
            path: path.into(),
            source,
        }
    }
}
