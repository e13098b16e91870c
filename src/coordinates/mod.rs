//! Coordinate resolution
//!
//! Resolves a US zip code to a latitude/longitude pair through an external
//! geocoding service. Callers depend on [`CoordinatesResolver`] so another
//! geocoding provider can be dropped in.

use async_trait::async_trait;

use crate::error::CoordinatesResolutionError;
use crate::models::Coordinates;

pub mod opendatasoft;

pub use opendatasoft::OpenDataSoftResolver;

#[async_trait]
pub trait CoordinatesResolver: Send + Sync {
    /// Resolve a zip code to coordinates
    async fn resolve(&self, zip_code: &str) -> Result<Coordinates, CoordinatesResolutionError>;
}

/// Trim the zip code and reject empty input
pub(crate) fn normalize_zip_code(zip_code: &str) -> Result<&str, CoordinatesResolutionError> {
    let trimmed = zip_code.trim();
    if trimmed.is_empty() {
        return Err(CoordinatesResolutionError::InvalidZipCode {
            zip_code: zip_code.to_string(),
        });
    }
    Ok(trimmed)
}
