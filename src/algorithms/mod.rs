//! Core positioning algorithms

pub mod geodesy;

pub use geodesy::{bearing, cross_track_distance, distance, normalize_longitude, project};
