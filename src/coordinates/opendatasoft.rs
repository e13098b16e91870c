//! OpenDataSoft zip code geocoding

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, error, instrument};

use super::{CoordinatesResolver, normalize_zip_code};
use crate::config::CoordinatesConfig;
use crate::error::CoordinatesResolutionError;
use crate::http::HttpClient;
use crate::models::Coordinates;

const PROVIDER: &str = "OpenDataSoft";

/// Resolves zip codes with the OpenDataSoft records search API
#[derive(Debug, Clone)]
pub struct OpenDataSoftResolver {
    http: HttpClient,
    base_url: String,
    dataset: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    fields: RecordFields,
}

#[derive(Debug, Deserialize)]
struct RecordFields {
    /// `[latitude, longitude]`
    geopoint: [f64; 2],
}

impl OpenDataSoftResolver {
    /// Provider name used in error messages
    pub const NAME: &'static str = PROVIDER;

    pub fn new(config: &CoordinatesConfig, http: HttpClient) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            dataset: config.dataset.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn query(&self, zip_code: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("dataset", self.dataset.clone()),
            ("q", zip_code.to_string()),
            ("rows", "1".to_string()),
        ];
        if let Some(api_key) = &self.api_key {
            query.push(("apikey", api_key.clone()));
        }
        query
    }
}

#[async_trait]
impl CoordinatesResolver for OpenDataSoftResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, zip_code: &str) -> Result<Coordinates, CoordinatesResolutionError> {
        let zip_code = normalize_zip_code(zip_code)?;
        let request_failed = CoordinatesResolutionError::RequestFailed { provider: PROVIDER };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = match self
            .http
            .get(&self.base_url, headers, &self.query(zip_code))
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

        let search: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body = %body, "Unexpected {PROVIDER} response");
            CoordinatesResolutionError::InvalidResponse {
                provider: PROVIDER,
                message: e.to_string(),
            }
        })?;

        let Some(record) = search.records.into_iter().next() else {
            let not_found = CoordinatesResolutionError::NotFound { provider: PROVIDER };
            error!(zip_code, "{not_found}");
            return Err(not_found);
        };

        let coordinates = Coordinates::from(record.fields.geopoint);
        debug!(zip_code, %coordinates, "Resolved zip code");
        Ok(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(api_key: Option<&str>) -> OpenDataSoftResolver {
        let config = CoordinatesConfig {
            api_key: api_key.map(str::to_string),
            ..CoordinatesConfig::default()
        };
        OpenDataSoftResolver::new(&config, HttpClient::new().unwrap())
    }

    #[test]
    fn test_query_params() {
        let query = resolver(None).query("27601");
        assert_eq!(
            query,
            vec![
                ("dataset", "us-zip-code-latitude-and-longitude".to_string()),
                ("q", "27601".to_string()),
                ("rows", "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_with_api_key() {
        let query = resolver(Some("some_key")).query("27601");
        assert_eq!(query.last(), Some(&("apikey", "some_key".to_string())));
    }

    #[test]
    fn test_search_response_geopoint() {
        let body = r#"{"records": [{"fields": {"geopoint": [35.774451, -78.63274], "zip": "27601"}}]}"#;
        let search: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(search.records[0].fields.geopoint, [35.774451, -78.63274]);
    }

    #[tokio::test]
    async fn test_empty_zip_code_is_rejected_without_request() {
        let err = resolver(None).resolve("  ").await.unwrap_err();
        assert!(matches!(
            err,
            CoordinatesResolutionError::InvalidZipCode { .. }
        ));
    }
}
