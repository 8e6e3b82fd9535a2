//! Hardware abstraction layer for positioning receivers
//!
//! This module provides the receiver contract used by the navigator, a gpsd
//! backed implementation, and a scripted mock for tests.

pub mod source;
pub mod gpsd;
pub mod mock;
pub mod error;

pub use source::PositioningSource;
pub use gpsd::GpsdSource;
pub use mock::{MockPositioningSource, ScriptedEvent};
pub use error::{CommError, CommResult, RecoveryStrategy};
