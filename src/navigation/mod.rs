//! Tour progression, link confirmation and instruction generation

pub mod link;
pub mod session;
pub mod tour;

pub use link::{LinkConfirmed, LinkError, LinkProbe, LinkState};
pub use session::{Instruction, NavigationMode, NavigationSession, TickOutcome, TickTime};
pub use tour::{clamp_proximity_radius, Advance, Tour, TourError, TourProgress, TourState};
