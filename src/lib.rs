//! `PlantGuard` - Weather forecasts for plant care
//!
//! This library resolves a zip code to coordinates and retrieves a multi-day
//! forecast for them, exposing daily precipitation, temperature range and
//! maximum wind so they can be compared against a plant's thresholds.

pub mod config;
pub mod coordinates;
pub mod error;
pub mod http;
pub mod models;
pub mod telemetry;
pub mod weather;

// Re-export core types for public API
pub use config::PlantGuardConfig;
pub use coordinates::{CoordinatesResolver, OpenDataSoftResolver};
pub use error::{CoordinatesResolutionError, ForecastRetrievalError, PlantGuardError};
pub use http::{HttpClient, RetryConfig};
pub use models::{
    Coordinates, DailyForecast, DailyPrecipitation, DailyTemperature, DailyWind,
    TemperatureRange,
};
pub use weather::{ClimaCellProvider, WeatherForecastProvider, daily_summary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlantGuardError>;

/// Resolve a zip code and build a forecast provider for it
///
/// The returned provider has not fetched anything yet.
pub async fn forecast_for_zip_code(
    config: &PlantGuardConfig,
    http: &HttpClient,
    zip_code: &str,
) -> Result<ClimaCellProvider> {
    let resolver = OpenDataSoftResolver::new(&config.coordinates, http.clone());
    let coordinates = resolver.resolve(zip_code).await?;
    Ok(ClimaCellProvider::new(
        coordinates,
        &config.forecast,
        http.clone(),
    ))
}
