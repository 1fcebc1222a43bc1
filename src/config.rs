//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first if present.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::units::Units;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Equipment store (JSON)
    pub data_path: PathBuf,
    /// Ride library (JSON)
    pub rides_path: PathBuf,
    /// Display unit system at startup
    pub units: Units,
    /// Override for the engine's worker count
    pub calc_threads: Option<usize>,
    /// How long shutdown waits for a running pass
    pub shutdown_timeout: Duration,
}

const DEFAULT_DATA_PATH: &str = "equipment-data.json";
const DEFAULT_RIDES_PATH: &str = "rides.json";
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            rides_path: PathBuf::from(DEFAULT_RIDES_PATH),
            units: Units::Metric,
            calc_threads: None,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let units = match env::var("EQUIPMENT_UNITS") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("EQUIPMENT_UNITS", v))?,
            Err(_) => Units::Metric,
        };

        let calc_threads = match env::var("EQUIPMENT_CALC_THREADS") {
            Ok(v) => match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => return Err(ConfigError::Invalid("EQUIPMENT_CALC_THREADS", v)),
            },
            Err(_) => None,
        };

        let shutdown_secs = match env::var("SHUTDOWN_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("SHUTDOWN_TIMEOUT_SECS", v))?,
            Err(_) => DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        };

        Ok(Self {
            data_path: env::var("EQUIPMENT_DATA_PATH")
                .unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string())
                .into(),
            rides_path: env::var("RIDES_PATH")
                .unwrap_or_else(|_| DEFAULT_RIDES_PATH.to_string())
                .into(),
            units,
            calc_threads,
            shutdown_timeout: Duration::from_secs(shutdown_secs),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment is process-wide; keep every env mutation in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("EQUIPMENT_DATA_PATH", "/tmp/gear.json");
        env::set_var("EQUIPMENT_UNITS", "imperial");
        env::set_var("EQUIPMENT_CALC_THREADS", "4");
        env::remove_var("SHUTDOWN_TIMEOUT_SECS");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.data_path, PathBuf::from("/tmp/gear.json"));
        assert_eq!(config.units, Units::Imperial);
        assert_eq!(config.calc_threads, Some(4));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));

        env::set_var("EQUIPMENT_CALC_THREADS", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("EQUIPMENT_CALC_THREADS", _))
        ));

        env::set_var("EQUIPMENT_CALC_THREADS", "2");
        env::set_var("EQUIPMENT_UNITS", "furlongs");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("EQUIPMENT_UNITS", _))
        ));

        env::remove_var("EQUIPMENT_UNITS");
        env::remove_var("EQUIPMENT_CALC_THREADS");
        env::remove_var("EQUIPMENT_DATA_PATH");
    }
}
