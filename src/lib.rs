//! Waypoint Navigator
//!
//! Guides a mobile platform around an ordered tour of GPS waypoints. Fixes
//! come from gpsd (or any [`hardware::PositioningSource`]), the visiting order
//! comes from an external TSP solver, and each tick yields the bearing and
//! distance to the next waypoint. A simulated mode dead-reckons along the tour
//! at a fixed speed for dry runs.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod hardware;
pub mod navigation;
pub mod api;

// Re-export commonly used types
pub use core::{Coordinate, Fix, FixQuality, RawFix, EARTH_RADIUS_M};
pub use algorithms::{bearing, cross_track_distance, distance, project};
pub use hardware::{CommError, CommResult, GpsdSource, MockPositioningSource, PositioningSource};
pub use processing::{ConcordeSolver, PositioningAdapter, TourPlanner, TourSolver};
pub use navigation::{
    Instruction, LinkConfirmed, LinkError, LinkProbe, NavigationMode, NavigationSession,
    TickOutcome, Tour, TourProgress, TourState,
};
pub use validation::NavigationError;
pub use utils::{Clock, ConfigurationManager, ManualClock, NavigatorConfig, SystemClock};
pub use api::{InstructionFormatter, OutputFormat};
