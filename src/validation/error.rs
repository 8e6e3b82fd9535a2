//! Error classification for the navigation loop and its inputs

/// Session queried or reconfigured out of order
///
/// These are operator mistakes, not faults: the session stays usable and
/// the caller reports the error and carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("positioning link has not been confirmed")]
    LinkNotConfirmed,
    #[error("proximity radius has not been set")]
    ProximityRadiusUnset,
    #[error("navigation mode is fixed once the session has started")]
    ModeLocked,
}

/// Why a coordinate was rejected
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateIssue {
    #[error("coordinate is not a finite number")]
    NotFinite,
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}
