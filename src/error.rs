//! Error types and handling for `PlantGuard`

use thiserror::Error;

/// Failures while resolving a zip code to coordinates
#[derive(Error, Debug)]
pub enum CoordinatesResolutionError {
    /// The upstream request failed after retries, or answered with a non-success status
    #[error("Failed to get the coordinates from the {provider} API")]
    RequestFailed { provider: &'static str },

    /// The upstream answered but had no record for the zip code
    #[error("The coordinates for the zip code could not be found using the {provider} API")]
    NotFound { provider: &'static str },

    /// The upstream body did not have the expected shape
    #[error("The {provider} API returned an unexpected coordinates response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    /// The zip code was rejected before any request was made
    #[error("Invalid zip code: {zip_code:?}")]
    InvalidZipCode { zip_code: String },
}

/// Failures while retrieving or reading a daily forecast
#[derive(Error, Debug)]
pub enum ForecastRetrievalError {
    /// The upstream request failed after retries, or answered with a non-success status
    #[error("Failed to get the daily forecast from the {provider} API")]
    RequestFailed { provider: &'static str },

    /// The upstream body could not be read as a forecast document
    #[error("The {provider} API returned an unexpected forecast response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    /// A day in the cached document lacks an observation an accessor needs
    #[error("The {provider} forecast for day {day} is missing {field}")]
    MissingObservation {
        provider: &'static str,
        day: usize,
        field: &'static str,
    },

    /// Daily sequences from one provider do not line up by day
    #[error(
        "Forecast sequences differ in length: {precipitation} precipitation, {temperature} temperature, {wind} wind days"
    )]
    MisalignedDays {
        precipitation: usize,
        temperature: usize,
        wind: usize,
    },
}

/// Main error type for the `PlantGuard` application
#[derive(Error, Debug)]
pub enum PlantGuardError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Zip code resolution errors
    #[error(transparent)]
    Coordinates(#[from] CoordinatesResolutionError),

    /// Forecast retrieval errors
    #[error(transparent)]
    Forecast(#[from] ForecastRetrievalError),

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl PlantGuardError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlantGuardError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            PlantGuardError::Coordinates(CoordinatesResolutionError::InvalidZipCode { zip_code }) => {
                format!("Invalid input: {zip_code:?} is not a zip code")
            }
            PlantGuardError::Coordinates(err) => err.to_string(),
            PlantGuardError::Forecast(err) => err.to_string(),
            PlantGuardError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// HTTP status a web layer should answer with for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            PlantGuardError::Coordinates(CoordinatesResolutionError::InvalidZipCode { .. }) => 400,
            PlantGuardError::Coordinates(CoordinatesResolutionError::NotFound { .. }) => 404,
            PlantGuardError::Coordinates(_) | PlantGuardError::Forecast(_) => 502,
            PlantGuardError::Config { .. } | PlantGuardError::Io { .. } => 500,
        }
    }
}
