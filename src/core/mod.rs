//! Core types and constants for the navigation system

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
