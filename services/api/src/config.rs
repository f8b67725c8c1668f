//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Latency and failure injection applied to every document store call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    /// Probability in `[0, 1]` that a call fails with a server error.
    pub error_rate: f64,
}

impl SimulationConfig {
    /// No delay and no injected failures.
    pub const DISABLED: SimulationConfig = SimulationConfig {
        latency_min_ms: 0,
        latency_max_ms: 0,
        error_rate: 0.0,
    };
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: 200,
            latency_max_ms: 1200,
            error_rate: 0.08,
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub simulation: SimulationConfig,
    pub seed_on_startup: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address = parse_or(&var, "BIND_ADDRESS", "0.0.0.0:3000".parse::<SocketAddr>().ok())?;

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite://talentflow.db?mode=rwc".to_string());

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Simulated Backend Settings ---
        let defaults = SimulationConfig::default();
        let simulation = SimulationConfig {
            latency_min_ms: parse_or(&var, "MOCK_LATENCY_MIN_MS", Some(defaults.latency_min_ms))?,
            latency_max_ms: parse_or(&var, "MOCK_LATENCY_MAX_MS", Some(defaults.latency_max_ms))?,
            error_rate: parse_or(&var, "MOCK_ERROR_RATE", Some(defaults.error_rate))?,
        };
        if simulation.latency_min_ms > simulation.latency_max_ms {
            return Err(ConfigError::InvalidValue(
                "MOCK_LATENCY_MIN_MS".to_string(),
                "must not exceed MOCK_LATENCY_MAX_MS".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&simulation.error_rate) {
            return Err(ConfigError::InvalidValue(
                "MOCK_ERROR_RATE".to_string(),
                format!("{} is not a probability", simulation.error_rate),
            ));
        }

        let seed_on_startup = parse_or(&var, "SEED_ON_STARTUP", Some(true))?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            simulation,
            seed_on_startup,
        })
    }
}

/// Parses a variable, falling back to `default` when it is unset.
fn parse_or<F, T>(var: &F, name: &str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(name.to_string())),
    }
}
