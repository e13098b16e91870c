//! Data models for the `PlantGuard` application
//!
//! This module contains the core domain models organized by concern:
//! - Coordinates: Geographic position resolved from a zip code
//! - Forecast: Daily forecast sequences derived from one upstream document

pub mod coordinates;
pub mod forecast;

// Re-export all public types for convenient access
pub use coordinates::Coordinates;
pub use forecast::{
    DailyForecast, DailyPrecipitation, DailyTemperature, DailyWind, TemperatureRange,
};
