//! Configuration, time and logging utilities

pub mod clock;
pub mod config;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{expand_home, ConfigError, ConfigurationManager, NavigatorConfig};
pub use logging::{init_logging, InstructionLog};
