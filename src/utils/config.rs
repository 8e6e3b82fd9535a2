//! Navigator configuration and runtime parameter management

use crate::core::{
    Coordinate, DEFAULT_POLL_TIMEOUT_MS, DEFAULT_PROBE_ATTEMPTS, GPSD_DEFAULT_PORT,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Navigator configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Host running the gpsd daemon
    pub gpsd_host: String,
    pub gpsd_port: u16,
    /// Longest wait for a single positioning report (milliseconds)
    pub poll_timeout_ms: u64,
    /// Polls per link probe
    pub probe_attempts: usize,
    /// Arrival radius (meters, clamped to at least 1)
    pub proximity_radius_m: f64,
    /// Simulated speed (m/s); zero or less navigates on live fixes
    pub simulation_velocity_mps: f64,
    /// Simulated start position; the first fix is used when absent
    pub simulation_start: Option<Coordinate>,
    /// Where point-set files are written (`~` is expanded)
    pub tsp_dir: String,
    /// Where solver output is written (`~` is expanded)
    pub solution_dir: String,
    /// Instruction log directory (`~` is expanded)
    pub log_dir: String,
    /// Solver executable
    pub concorde_path: String,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            gpsd_host: "127.0.0.1".to_string(),
            gpsd_port: GPSD_DEFAULT_PORT,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            probe_attempts: DEFAULT_PROBE_ATTEMPTS,
            proximity_radius_m: 10.0,
            simulation_velocity_mps: 1.0,
            simulation_start: None,
            tsp_dir: "~/.awns-rpi5/tsp".to_string(),
            solution_dir: "~/.awns-rpi5/sol".to_string(),
            log_dir: "~/.awns-rpi5/log".to_string(),
            concorde_path: "concorde".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl NavigatorConfig {
    /// Check every parameter, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gpsd_host.trim().is_empty() {
            return Err(invalid("gpsd_host", &self.gpsd_host, "host must not be empty"));
        }
        if self.poll_timeout_ms == 0 {
            return Err(invalid("poll_timeout_ms", 0, "timeout must be positive"));
        }
        if self.probe_attempts == 0 {
            return Err(invalid("probe_attempts", 0, "at least one poll is required"));
        }
        if !self.proximity_radius_m.is_finite() {
            return Err(invalid(
                "proximity_radius_m",
                self.proximity_radius_m,
                "radius must be finite",
            ));
        }
        if !self.simulation_velocity_mps.is_finite() {
            return Err(invalid(
                "simulation_velocity_mps",
                self.simulation_velocity_mps,
                "velocity must be finite",
            ));
        }
        if let Some(start) = &self.simulation_start {
            if !start.is_valid() {
                return Err(invalid(
                    "simulation_start",
                    start,
                    "latitude must be within ±90 and longitude within ±180",
                ));
            }
        }
        for (parameter, value) in [
            ("tsp_dir", &self.tsp_dir),
            ("solution_dir", &self.solution_dir),
            ("log_dir", &self.log_dir),
            ("concorde_path", &self.concorde_path),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(parameter, value, "path must not be empty"));
            }
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn tsp_dir(&self) -> PathBuf {
        expand_home(&self.tsp_dir)
    }

    pub fn solution_dir(&self) -> PathBuf {
        expand_home(&self.solution_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        expand_home(&self.log_dir)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("cannot access config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("no file path set for saving configuration")]
    NoFilePath,
}

fn invalid(parameter: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory
///
/// Paths without one, or without `HOME` set, come back unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

/// Configuration manager with validated runtime updates
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: NavigatorConfig,
    config_file_path: Option<PathBuf>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a manager holding the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager and load `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Replace the whole configuration after validating it
    pub fn update_config(&mut self, config: NavigatorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from a JSON file
    ///
    /// Missing fields take their defaults. The current configuration is kept
    /// if the file is unreadable or invalid.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: NavigatorConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        self.config = config;
        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.config).map_err(ConfigError::Serialize)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save to the file last loaded or saved
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::NoFilePath),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime parameter adjustment. Each setter returns the previous value.

    pub fn set_poll_timeout(&mut self, timeout_ms: u64) -> Result<u64, ConfigError> {
        if timeout_ms == 0 {
            return Err(invalid("poll_timeout_ms", timeout_ms, "timeout must be positive"));
        }
        let old_value = self.config.poll_timeout_ms;
        self.config.poll_timeout_ms = timeout_ms;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn set_probe_attempts(&mut self, attempts: usize) -> Result<usize, ConfigError> {
        if attempts == 0 {
            return Err(invalid("probe_attempts", attempts, "at least one poll is required"));
        }
        let old_value = self.config.probe_attempts;
        self.config.probe_attempts = attempts;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Values below the floor are accepted; the session clamps them
    pub fn set_proximity_radius(&mut self, radius_m: f64) -> Result<f64, ConfigError> {
        if !radius_m.is_finite() {
            return Err(invalid("proximity_radius_m", radius_m, "radius must be finite"));
        }
        let old_value = self.config.proximity_radius_m;
        self.config.proximity_radius_m = radius_m;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn set_simulation_velocity(&mut self, velocity_mps: f64) -> Result<f64, ConfigError> {
        if !velocity_mps.is_finite() {
            return Err(invalid(
                "simulation_velocity_mps",
                velocity_mps,
                "velocity must be finite",
            ));
        }
        let old_value = self.config.simulation_velocity_mps;
        self.config.simulation_velocity_mps = velocity_mps;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn set_simulation_start(
        &mut self,
        start: Option<Coordinate>,
    ) -> Result<Option<Coordinate>, ConfigError> {
        if let Some(coordinate) = &start {
            if !coordinate.is_valid() {
                return Err(invalid(
                    "simulation_start",
                    coordinate,
                    "latitude must be within ±90 and longitude within ±180",
                ));
            }
        }
        let old_value = self.config.simulation_start;
        self.config.simulation_start = start;
        self.is_modified = true;
        Ok(old_value)
    }
}
