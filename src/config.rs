//! Configuration management for the region weather collector
//!
//! Handles loading configuration from files, `.env` and environment variables,
//! and provides validation for all configuration settings.

use crate::CollectorError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the OpenWeather API key
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "REGION_WEATHER_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Remote service configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Sampling, concurrency and retry knobs
    #[serde(default)]
    pub collection: CollectionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Output artifact settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote geocoding/weather service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// OpenWeather API key
    pub api_key: Option<String>,
    /// Reverse geocoding endpoint
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    /// Current weather endpoint
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Collection pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Grid subdivisions per axis; `(density + 1)^2` points are probed
    #[serde(default = "default_grid_density")]
    pub grid_density: u32,
    /// Maximum candidates requested per reverse geocoding call
    #[serde(default = "default_geocoding_limit")]
    pub geocoding_limit: u32,
    /// Shared cap on in-flight HTTP requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Weather attempts per city, first try included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed pause between weather attempts, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Output artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the timestamped JSON file is written to
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

// Default value functions
fn default_geocoding_url() -> String {
    "https://api.openweathermap.org/geo/1.0/reverse".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_grid_density() -> u32 {
    3
}

fn default_geocoding_limit() -> u32 {
    5
}

fn default_max_concurrent_requests() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_output_directory() -> String {
    ".".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocoding_url: default_geocoding_url(),
            weather_url: default_weather_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            grid_density: default_grid_density(),
            geocoding_limit: default_geocoding_limit(),
            max_concurrent_requests: default_max_concurrent_requests(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl CollectionConfig {
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl CollectorConfig {
    /// Load configuration from `.env`, the config file and environment variables
    pub fn load() -> Result<Self> {
        load_dotenv();
        let path = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_from_path(path)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.or_else(Self::get_config_path);

        if let Some(config_file) = config_file.filter(|p| p.exists()) {
            debug!("Reading configuration from {}", config_file.display());
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // e.g. REGION_WEATHER_COLLECTION__GRID_DENSITY=5
        builder = builder.add_source(
            Environment::with_prefix("REGION_WEATHER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CollectorConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.api.api_key.is_none() {
            config.api.api_key = env::var(API_KEY_ENV).ok();
        }

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("region-weather").join("config.toml"))
    }

    /// The API key, or a configuration error if none is set
    pub fn api_key(&self) -> crate::Result<&str> {
        self.api
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                CollectorError::config(format!(
                    "No API key configured. Set {API_KEY_ENV} or api.api_key in the config file"
                ))
            })
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        self.api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> crate::Result<()> {
        let collection = &self.collection;

        if collection.grid_density == 0 {
            return Err(CollectorError::config("Grid density must be at least 1"));
        }

        if collection.geocoding_limit == 0 {
            return Err(CollectorError::config("Geocoding limit must be at least 1"));
        }

        if collection.max_concurrent_requests == 0 {
            return Err(CollectorError::config(
                "Maximum concurrent requests must be at least 1",
            ));
        }

        if collection.max_attempts == 0 {
            return Err(CollectorError::config("Weather attempts must be at least 1"));
        }

        if self.api.timeout_seconds == 0 || self.api.timeout_seconds > 300 {
            return Err(CollectorError::config(
                "API timeout must be between 1 and 300 seconds",
            ));
        }

        Ok(())
    }

    fn validate_string_values(&self) -> crate::Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CollectorError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CollectorError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        for url in [&self.api.geocoding_url, &self.api.weather_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CollectorError::config(format!(
                    "Endpoint '{url}' must be a valid HTTP or HTTPS URL"
                )));
            }
        }

        Ok(())
    }
}

fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}
