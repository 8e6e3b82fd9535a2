//! Data validation and error classification

pub mod data;
pub mod error;

pub use data::{parse_coordinate, validate_coordinate, FieldError};
pub use error::{CoordinateIssue, NavigationError};
