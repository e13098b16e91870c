//! Configuration management for `PlantGuard`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PlantGuardError;
use crate::http::RetryConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `PlantGuard`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantGuardConfig {
    /// Zip code geocoding API configuration
    #[serde(default)]
    pub coordinates: CoordinatesConfig,
    /// Forecast API configuration
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Retry backoff for outbound requests
    #[serde(default)]
    pub http: RetryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Geocoding API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatesConfig {
    /// Records search endpoint
    #[serde(default = "default_coordinates_base_url")]
    pub base_url: String,
    /// Dataset holding zip code geopoints
    #[serde(default = "default_coordinates_dataset")]
    pub dataset: String,
    /// API key (optional for public datasets)
    pub api_key: Option<String>,
}

/// Forecast API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Daily forecast endpoint
    #[serde(default = "default_forecast_base_url")]
    pub base_url: String,
    /// API key sent in the `apikey` header
    pub api_key: Option<String>,
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

// Default value functions
fn default_coordinates_base_url() -> String {
    "https://public.opendatasoft.com/api/records/1.0/search/".to_string()
}

fn default_coordinates_dataset() -> String {
    "us-zip-code-latitude-and-longitude".to_string()
}

fn default_forecast_base_url() -> String {
    "https://api.climacell.co/v3/weather/forecast/daily".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for CoordinatesConfig {
    fn default() -> Self {
        Self {
            base_url: default_coordinates_base_url(),
            dataset: default_coordinates_dataset(),
            api_key: None,
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: default_forecast_base_url(),
            api_key: None,
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

impl PlantGuardConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. PLANTGUARD_FORECAST__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("PLANTGUARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PlantGuardConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("plantguard").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.coordinates.base_url.is_empty() {
            self.coordinates.base_url = default_coordinates_base_url();
        }
        if self.coordinates.dataset.is_empty() {
            self.coordinates.dataset = default_coordinates_dataset();
        }
        if self.forecast.base_url.is_empty() {
            self.forecast.base_url = default_forecast_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        // Blank keys from the environment mean "no key"
        for key in [&mut self.coordinates.api_key, &mut self.forecast.api_key] {
            if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                *key = None;
            }
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_urls()?;
        self.validate_backoff()?;
        self.validate_logging()?;
        Ok(())
    }

    fn validate_urls(&self) -> Result<()> {
        for (name, url) in [
            ("Coordinates", &self.coordinates.base_url),
            ("Forecast", &self.forecast.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlantGuardError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }
        Ok(())
    }

    fn validate_backoff(&self) -> Result<()> {
        if self.http.min_backoff_ms == 0 {
            return Err(PlantGuardError::config("Minimum retry backoff must be positive").into());
        }

        if self.http.min_backoff_ms > self.http.max_backoff_ms {
            return Err(PlantGuardError::config(
                "Minimum retry backoff cannot exceed the maximum retry backoff",
            )
            .into());
        }

        Ok(())
    }

    fn validate_logging(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PlantGuardError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PlantGuardError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}
