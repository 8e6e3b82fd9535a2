//! Waypoint CSV ingestion
//!
//! The first line is a header naming latitude and longitude, in that order.
//! Bad rows are reported and skipped; a file with no good rows is an error.

use crate::core::Coordinate;
use crate::processing::TourFileError;
use crate::validation::parse_coordinate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Waypoints loaded from one CSV file
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSet {
    pub source: PathBuf,
    pub points: Vec<Coordinate>,
    /// Data rows seen, header excluded
    pub total_rows: usize,
}

impl WaypointSet {
    /// File stem used to name derived point-set and solution files
    pub fn name(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tour".to_string())
    }

    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Read waypoints from a CSV file
pub fn read_waypoints<P: AsRef<Path>>(path: P) -> Result<WaypointSet, TourFileError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| TourFileError::io(path, e))?;
    let (points, total_rows) = parse_waypoints(&content);

    if points.is_empty() {
        return Err(TourFileError::NoWaypoints {
            path: path.to_path_buf(),
        });
    }

    info!(
        loaded = points.len(),
        rows = total_rows,
        path = %path.display(),
        "Waypoints loaded"
    );
    Ok(WaypointSet {
        source: path.to_path_buf(),
        points,
        total_rows,
    })
}

/// Parse CSV text, returning the valid points and the number of data rows
pub fn parse_waypoints(content: &str) -> (Vec<Coordinate>, usize) {
    let mut points = Vec::new();
    let mut total_rows = 0;

    for (line_no, line) in content.lines().skip(1).enumerate() {
        total_rows += 1;
        let line_no = line_no + 1;

        let mut fields = line.split(',');
        let (Some(latitude), Some(longitude)) = (fields.next(), fields.next()) else {
            warn!(line = line_no, "Line malformed, skipping");
            continue;
        };

        match parse_coordinate(latitude, longitude) {
            Ok(point) => points.push(point),
            Err(e) => warn!(line = line_no, reason = %e, "Skipping waypoint row"),
        }
    }

    (points, total_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_bad_rows() {
        let csv = "latitude,longitude\n\
                   47.6205,-122.3493\n\
                   only-one-field\n\
                   ,-122.0\n\
                   abc,1.0\n\
                   91.0,1.0\n\
                   -33.8568,151.2153,extra\n";
        let (points, rows) = parse_waypoints(csv);

        assert_eq!(rows, 6);
        assert_eq!(
            points,
            vec![
                Coordinate::new(47.6205, -122.3493),
                Coordinate::new(-33.8568, 151.2153)
            ]
        );
    }

    #[test]
    fn test_header_only_is_empty() {
        let (points, rows) = parse_waypoints("lat,lon\n");
        assert!(points.is_empty());
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "lat,lon").unwrap();
        writeln!(file, "1.5,2.5").unwrap();
        writeln!(file, "3.5,4.5").unwrap();
        drop(file);

        let set = read_waypoints(&path).unwrap();
        assert_eq!(set.points.len(), 2);
        assert_eq!(set.total_rows, 2);
        assert_eq!(set.name(), "campus");
        assert_eq!(set.file_name(), "campus.csv");
    }

    #[test]
    fn test_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_waypoints(dir.path().join("missing.csv")),
            Err(TourFileError::Io { .. })
        ));

        let path = dir.path().join("empty.csv");
        fs::write(&path, "lat,lon\nx,y\n").unwrap();
        assert!(matches!(
            read_waypoints(&path),
            Err(TourFileError::NoWaypoints { .. })
        ));
    }
}
