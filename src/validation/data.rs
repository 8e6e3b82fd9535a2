//! Input data validation for waypoint coordinates

use crate::core::Coordinate;
use crate::validation::error::CoordinateIssue;

/// Check that a coordinate is usable by the geodesy engine
pub fn validate_coordinate(coordinate: &Coordinate) -> Result<(), CoordinateIssue> {
    if !coordinate.latitude.is_finite() || !coordinate.longitude.is_finite() {
        return Err(CoordinateIssue::NotFinite);
    }
    if !(-90.0..=90.0).contains(&coordinate.latitude) {
        return Err(CoordinateIssue::LatitudeOutOfRange(coordinate.latitude));
    }
    if !(-180.0..=180.0).contains(&coordinate.longitude) {
        return Err(CoordinateIssue::LongitudeOutOfRange(coordinate.longitude));
    }
    Ok(())
}

/// Parse one `latitude,longitude` field pair into a validated coordinate
pub fn parse_coordinate(latitude: &str, longitude: &str) -> Result<Coordinate, FieldError> {
    let latitude = latitude.trim();
    let longitude = longitude.trim();
    if latitude.is_empty() || longitude.is_empty() {
        return Err(FieldError::Blank);
    }

    let coordinate = Coordinate::new(
        latitude.parse().map_err(|_| FieldError::Malformed(latitude.to_string()))?,
        longitude.parse().map_err(|_| FieldError::Malformed(longitude.to_string()))?,
    );
    validate_coordinate(&coordinate).map_err(FieldError::OutOfRange)?;
    Ok(coordinate)
}

/// Why a waypoint row was skipped
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("contains blank fields")]
    Blank,
    #[error("contains malformed number '{0}'")]
    Malformed(String),
    #[error("{0}")]
    OutOfRange(CoordinateIssue),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinate() {
        assert!(validate_coordinate(&Coordinate::new(45.0, -122.0)).is_ok());
        assert_eq!(
            validate_coordinate(&Coordinate::new(95.0, 0.0)),
            Err(CoordinateIssue::LatitudeOutOfRange(95.0))
        );
        assert_eq!(
            validate_coordinate(&Coordinate::new(0.0, -181.0)),
            Err(CoordinateIssue::LongitudeOutOfRange(-181.0))
        );
        assert_eq!(
            validate_coordinate(&Coordinate::new(f64::INFINITY, 0.0)),
            Err(CoordinateIssue::NotFinite)
        );
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate(" 47.5 ", "-122.25\r"),
            Ok(Coordinate::new(47.5, -122.25))
        );
        assert_eq!(parse_coordinate("", "1.0"), Err(FieldError::Blank));
        assert_eq!(
            parse_coordinate("north", "1.0"),
            Err(FieldError::Malformed("north".into()))
        );
        assert!(matches!(
            parse_coordinate("120", "1.0"),
            Err(FieldError::OutOfRange(_))
        ));
    }
}
