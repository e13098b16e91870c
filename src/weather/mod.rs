//! Daily weather forecasts
//!
//! A [`WeatherForecastProvider`] is bound to one pair of coordinates. It
//! fetches the upstream forecast document on first use and derives every
//! accessor from that same document, so all sequences have the same length
//! and day order.

use async_trait::async_trait;

use crate::error::ForecastRetrievalError;
use crate::models::{DailyForecast, DailyPrecipitation, DailyTemperature, DailyWind};

pub mod climacell;

pub use climacell::ClimaCellProvider;

#[async_trait]
pub trait WeatherForecastProvider: Send + Sync {
    /// Daily precipitation accumulation in inches, day 0 first
    async fn precipitation_forecast(&self) -> Result<DailyPrecipitation, ForecastRetrievalError>;

    /// Daily low and high temperature in Fahrenheit, day 0 first
    async fn temperature_forecast(&self) -> Result<DailyTemperature, ForecastRetrievalError>;

    /// Daily maximum wind speed in mph, day 0 first
    async fn wind_forecast(&self) -> Result<DailyWind, ForecastRetrievalError>;
}

/// Combine the three accessors of a provider into per-day rows
pub async fn daily_summary<P>(provider: &P) -> Result<Vec<DailyForecast>, ForecastRetrievalError>
where
    P: WeatherForecastProvider + ?Sized,
{
    let precipitation = provider.precipitation_forecast().await?;
    let temperature = provider.temperature_forecast().await?;
    let wind = provider.wind_forecast().await?;

    DailyForecast::zip_days(&precipitation, &temperature, &wind).ok_or(
        ForecastRetrievalError::MisalignedDays {
            precipitation: precipitation.len(),
            temperature: temperature.len(),
            wind: wind.len(),
        },
    )
}
