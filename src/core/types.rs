//! Core data types for the navigation system

use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// True if both components are finite and inside the geodetic ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Receiver fix quality, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FixQuality {
    /// Receiver has not reported a mode yet
    NotSeen,
    /// Receiver is up but has no position
    NoFix,
    /// Latitude and longitude known, altitude may not be
    Fix2D,
    /// Full three dimensional fix
    Fix3D,
}

impl FixQuality {
    /// Map a gpsd `mode` value (0..=3) to a quality
    pub fn from_gpsd_mode(mode: u8) -> Self {
        match mode {
            0 => FixQuality::NotSeen,
            1 => FixQuality::NoFix,
            2 => FixQuality::Fix2D,
            _ => FixQuality::Fix3D,
        }
    }

    pub fn has_position(self) -> bool {
        self >= FixQuality::Fix2D
    }
}

/// A reading exactly as the positioning source reports it, before filtering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFix {
    pub quality: FixQuality,
    pub latitude: f64,
    pub longitude: f64,
    /// Course over ground, degrees from true north
    pub heading: Option<f64>,
    /// Capture time in seconds since the Unix epoch
    pub timestamp: f64,
}

impl RawFix {
    pub fn new(quality: FixQuality, latitude: f64, longitude: f64, timestamp: f64) -> Self {
        Self {
            quality,
            latitude,
            longitude,
            heading: None,
            timestamp,
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    /// Placeholder used before the source has produced any report
    pub fn unseen() -> Self {
        Self::new(FixQuality::NotSeen, 0.0, 0.0, 0.0)
    }
}

/// An accepted, fresh positioning fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub position: Coordinate,
    pub heading: Option<f64>,
    pub timestamp: f64,
}

impl From<RawFix> for Fix {
    fn from(raw: RawFix) -> Self {
        Self {
            position: Coordinate::new(raw.latitude, raw.longitude),
            heading: raw.heading,
            timestamp: raw.timestamp,
        }
    }
}

impl std::fmt::Display for Fix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Latitude: {:.6}, Longitude: {:.6}, Bearing: {}]",
            self.position.latitude,
            self.position.longitude,
            self.heading.map_or_else(|| "n/a".to_string(), |h| format!("{:.1}", h))
        )
    }
}
