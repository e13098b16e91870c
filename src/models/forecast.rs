//! Daily forecast sequences
//!
//! Every sequence is indexed by day, with day 0 being today. Sequences derived
//! from the same upstream document have the same length.

use serde::{Deserialize, Serialize};

/// Daily precipitation accumulation in inches
pub type DailyPrecipitation = Vec<f64>;

/// Daily temperature range in Fahrenheit
pub type DailyTemperature = Vec<TemperatureRange>;

/// Daily maximum wind speed in miles per hour
pub type DailyWind = Vec<f64>;

/// Low and high temperature of a day in Fahrenheit
///
/// The two values come from different observation slots upstream, so `min <= max`
/// is not guaranteed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

impl TemperatureRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl From<(f64, f64)> for TemperatureRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// One day of the forecast with all three accessors combined
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecast {
    /// Day offset from today
    pub day: usize,
    /// Precipitation accumulation in inches
    pub precipitation_in: f64,
    /// Temperature range in Fahrenheit
    pub temperature: TemperatureRange,
    /// Maximum wind speed in mph
    pub max_wind_mph: f64,
}

impl DailyForecast {
    /// Zip index-aligned daily sequences into per-day rows
    ///
    /// Returns `None` when the sequences do not have the same length.
    #[must_use]
    pub fn zip_days(
        precipitation: &[f64],
        temperature: &[TemperatureRange],
        wind: &[f64],
    ) -> Option<Vec<Self>> {
        if precipitation.len() != temperature.len() || precipitation.len() != wind.len() {
            return None;
        }

        Some(
            precipitation
                .iter()
                .zip(temperature)
                .zip(wind)
                .enumerate()
                .map(|(day, ((&precipitation_in, &temperature), &max_wind_mph))| Self {
                    day,
                    precipitation_in,
                    temperature,
                    max_wind_mph,
                })
                .collect(),
        )
    }

    /// Format the temperature range with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!(
            "{:.1}°F / {:.1}°F",
            self.temperature.min, self.temperature.max
        )
    }

    /// Format the precipitation with unit
    #[must_use]
    pub fn format_precipitation(&self) -> String {
        format!("{:.2} in", self.precipitation_in)
    }

    /// Format the maximum wind with unit
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} mph", self.max_wind_mph)
    }
}
