//! Physical constants and system parameters

/// Mean Earth radius used by the spherical model (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Smallest accepted proximity radius (m)
pub const MIN_PROXIMITY_RADIUS_M: f64 = 1.0;

/// Default number of consecutive polls used to confirm the positioning link
pub const DEFAULT_PROBE_ATTEMPTS: usize = 6;

/// Default per-poll timeout (ms)
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1500;

/// Default gpsd port
pub const GPSD_DEFAULT_PORT: u16 = 2947;
