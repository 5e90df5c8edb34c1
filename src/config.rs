//! Configuration loader for the `minemetrics` pipeline.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase: the weather
//! site coordinates and destination credentials travel inside [`Config`]
//! into the components that need them.
use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional float environment variable with a default value.
macro_rules! parse_env_f64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Weather-service settings for the mining site.
///
/// The coordinates identify the single site this pipeline serves; they are
/// configuration, not ambient lookups inside the client.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    // ---
    /// Forecast API base URL.
    pub api_url: String,

    /// Site latitude in decimal degrees.
    pub latitude: f64,

    /// Site longitude in decimal degrees.
    pub longitude: f64,

    /// IANA timezone the daily series is keyed to.
    pub timezone: String,

    /// Per-request timeout in seconds for the weather call.
    pub timeout_secs: u32,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string for the destination store.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Destination table receiving the daily metrics rows.
    pub metrics_table: String,

    /// Which sink implementation to construct ("postgres").
    pub sink_backend: String,

    /// Weather-service settings.
    pub weather: WeatherConfig,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `METRICS_TABLE` – destination table (default: `daily_production_metric`)
/// - `SINK_BACKEND` – sink implementation (default: `postgres`)
/// - `WEATHER_API_URL` – forecast endpoint (default: Open-Meteo)
/// - `WEATHER_LATITUDE` / `WEATHER_LONGITUDE` – site coordinates
///   (default: 2.0167 / 117.3)
/// - `WEATHER_TIMEZONE` – daily-series timezone (default: `Asia/Jakarta`)
/// - `WEATHER_TIMEOUT_SECS` – weather request timeout (default: 10)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let metrics_table = env_or!("METRICS_TABLE", "daily_production_metric");
    let sink_backend = env_or!("SINK_BACKEND", "postgres");

    let weather = WeatherConfig {
        api_url: env_or!("WEATHER_API_URL", "https://api.open-meteo.com/v1/forecast"),
        latitude: parse_env_f64!("WEATHER_LATITUDE", 2.0167),
        longitude: parse_env_f64!("WEATHER_LONGITUDE", 117.3),
        timezone: env_or!("WEATHER_TIMEZONE", "Asia/Jakarta"),
        timeout_secs: parse_env_u32!("WEATHER_TIMEOUT_SECS", 10),
    };

    Ok(Config {
        db_url,
        db_pool_max,
        metrics_table,
        sink_backend,
        weather,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL         : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX          : {}", self.db_pool_max);
        tracing::info!("  METRICS_TABLE        : {}", self.metrics_table);
        tracing::info!("  SINK_BACKEND         : {}", self.sink_backend);
        tracing::info!("  WEATHER_API_URL      : {}", self.weather.api_url);
        tracing::info!(
            "  WEATHER_SITE         : {}, {} ({})",
            self.weather.latitude,
            self.weather.longitude,
            self.weather.timezone
        );
        tracing::info!("  WEATHER_TIMEOUT_SECS : {}", self.weather.timeout_secs);
    }
}
