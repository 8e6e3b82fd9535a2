//! Positioning input processing and tour file plumbing

pub mod adapter;
pub mod error;
pub mod waypoints;
pub mod tsplib;
pub mod solver;
pub mod planner;

pub use adapter::PositioningAdapter;
pub use error::TourFileError;
pub use waypoints::{read_waypoints, WaypointSet};
pub use solver::{ConcordeSolver, SolverError, TourSolver};
pub use planner::{BatchSummary, PlannedTour, PlanningError, TourPlanner};
