//! Geocoding provider adapters.
//!
//! Each adapter turns one request into exactly one network call and maps the
//! provider's response onto the common result types. Faults never escape an
//! adapter: they become a result whose status and `error_message` describe
//! what went wrong.

mod census;
mod google;
mod http;
mod mapbox;
mod nominatim;
mod registry;

use std::time::Instant;

use async_trait::async_trait;

use crate::error_handling::GeocodingError;
use crate::models::{GeocodingRequest, GeocodingResult, ProviderId, ReverseGeocodingResult};

pub use census::CensusProvider;
pub use google::GoogleProvider;
pub use mapbox::MapboxProvider;
pub use nominatim::NominatimProvider;
pub use registry::{build_provider, build_registry};

/// A geocoding service the pipeline can consult.
///
/// Implementations must be cheap to share (`Arc<dyn GeocodingProvider>`) and
/// must not panic on bad input; the pipeline still contains a panic as an
/// empty attempt.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Identifier used for ordering, rate limiting and attribution.
    fn id(&self) -> ProviderId;

    /// Resolves an address to coordinates.
    async fn geocode(&self, request: &GeocodingRequest) -> GeocodingResult;

    /// Resolves coordinates to an address.
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ReverseGeocodingResult;
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn log_fault(provider: ProviderId, error: &GeocodingError) {
    match error {
        GeocodingError::NotFound(_) => log::debug!("{}: {}", provider, error),
        _ => log::warn!("{}: {}", provider, error),
    }
}

/// Converts an adapter's internal outcome into a forward result.
pub(crate) fn finish_forward(
    provider: ProviderId,
    request: &GeocodingRequest,
    started: Instant,
    outcome: Result<GeocodingResult, GeocodingError>,
) -> GeocodingResult {
    let result = outcome.unwrap_or_else(|error| {
        log_fault(provider, &error);
        GeocodingResult::failure(
            request.address.clone(),
            Some(provider),
            error.status(),
            error.to_string(),
        )
    });
    result.with_response_time(elapsed_ms(started))
}

/// Converts an adapter's internal outcome into a reverse result.
pub(crate) fn finish_reverse(
    provider: ProviderId,
    latitude: f64,
    longitude: f64,
    started: Instant,
    outcome: Result<ReverseGeocodingResult, GeocodingError>,
) -> ReverseGeocodingResult {
    let result = outcome.unwrap_or_else(|error| {
        log_fault(provider, &error);
        ReverseGeocodingResult::failure(
            latitude,
            longitude,
            Some(provider),
            error.status(),
            error.to_string(),
        )
    });
    result.with_response_time(elapsed_ms(started))
}

/// Trims a provider string field, dropping it when blank.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
