//! ClimaCell daily forecast provider

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, instrument};

use super::WeatherForecastProvider;
use crate::config::ForecastConfig;
use crate::error::ForecastRetrievalError;
use crate::http::HttpClient;
use crate::models::{
    Coordinates, DailyPrecipitation, DailyTemperature, DailyWind, TemperatureRange,
};

const PROVIDER: &str = "ClimaCell";

/// Fields requested from the daily forecast endpoint
const FORECAST_FIELDS: [&str; 3] = ["precipitation_accumulation", "temp", "wind_speed"];

/// Daily forecast for one pair of coordinates from the ClimaCell API
///
/// The forecast document is fetched on the first accessor call and kept for the
/// lifetime of the provider. A failed fetch is not cached.
#[derive(Debug)]
pub struct ClimaCellProvider {
    http: HttpClient,
    base_url: String,
    coordinates: Coordinates,
    api_key: Option<String>,
    /// One JSON object per day, day 0 first
    forecast: OnceCell<Vec<Value>>,
}

/// Read a measurement at `pointer` as `f64`
///
/// Upstream values are JSON numbers or numeric strings; anything else, `null`
/// included, counts as missing.
fn measurement(day: &Value, pointer: &str) -> Option<f64> {
    match day.pointer(pointer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn precipitation(day: &Value) -> Option<f64> {
    measurement(day, "/precipitation_accumulation/value")
}

/// Slot 0 supplies the low and slot 1 the high, whatever their timestamps
fn temperature(day: &Value) -> Option<TemperatureRange> {
    let min = measurement(day, "/temp/0/min/value")?;
    let max = measurement(day, "/temp/1/max/value")?;
    Some(TemperatureRange::new(min, max))
}

/// Only slot 1 is read; the minimum wind in slot 0 is not exposed
fn max_wind(day: &Value) -> Option<f64> {
    measurement(day, "/wind_speed/1/max/value")
}

impl ClimaCellProvider {
    /// Provider name used in error messages
    pub const NAME: &'static str = PROVIDER;

    pub fn new(coordinates: Coordinates, config: &ForecastConfig, http: HttpClient) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            coordinates,
            api_key: config.api_key.clone(),
            forecast: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("lat", self.coordinates.latitude.to_string()),
            ("lon", self.coordinates.longitude.to_string()),
            ("unit_system", "us".to_string()),
        ];
        query.extend(FORECAST_FIELDS.iter().map(|field| ("fields", field.to_string())));
        query
    }

    fn headers(&self) -> Result<HeaderMap, ForecastRetrievalError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(api_key).map_err(|e| {
                error!(error = %e, "The {PROVIDER} API key is not a valid header value");
                ForecastRetrievalError::RequestFailed { provider: PROVIDER }
            })?;
            headers.insert(HeaderName::from_static("apikey"), value);
        }
        Ok(headers)
    }

    /// The cached forecast document, fetched on first use
    async fn forecast(&self) -> Result<&[Value], ForecastRetrievalError> {
        self.forecast
            .get_or_try_init(|| self.fetch_forecast())
            .await
            .map(Vec::as_slice)
    }

    #[instrument(skip(self), fields(coordinates = %self.coordinates))]
    async fn fetch_forecast(&self) -> Result<Vec<Value>, ForecastRetrievalError> {
        let request_failed = ForecastRetrievalError::RequestFailed { provider: PROVIDER };

        let response = match self
            .http
            .get(&self.base_url, self.headers()?, &self.query())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "{request_failed}");
                return Err(request_failed);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "{request_failed}");
                return Err(request_failed);
            }
        };

        if !status.is_success() {
            error!(
                status = status.as_u16(),
                body = %body,
                "{request_failed}. The status code was {}. The text was {body}.",
                status.as_u16()
            );
            return Err(request_failed);
        }

        let days: Vec<Value> = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body = %body, "Unexpected {PROVIDER} response");
            ForecastRetrievalError::InvalidResponse {
                provider: PROVIDER,
                message: e.to_string(),
            }
        })?;

        debug!(days = days.len(), "Fetched daily forecast");
        Ok(days)
    }

    /// Apply `extract` to every cached day, failing on the first day it cannot read
    async fn per_day<T>(
        &self,
        field: &'static str,
        extract: impl Fn(&Value) -> Option<T>,
    ) -> Result<Vec<T>, ForecastRetrievalError> {
        self.forecast()
            .await?
            .iter()
            .enumerate()
            .map(|(day, forecast)| {
                extract(forecast).ok_or_else(|| {
                    error!(day, field, "Forecast day is missing an observation");
                    ForecastRetrievalError::MissingObservation {
                        provider: PROVIDER,
                        day,
                        field,
                    }
                })
            })
            .collect()
    }
}

#[async_trait]
impl WeatherForecastProvider for ClimaCellProvider {
    async fn precipitation_forecast(&self) -> Result<DailyPrecipitation, ForecastRetrievalError> {
        self.per_day("precipitation_accumulation", precipitation).await
    }

    async fn temperature_forecast(&self) -> Result<DailyTemperature, ForecastRetrievalError> {
        self.per_day("temp[0].min or temp[1].max", temperature).await
    }

    async fn wind_forecast(&self) -> Result<DailyWind, ForecastRetrievalError> {
        self.per_day("wind_speed[1].max", max_wind).await
    }
}
