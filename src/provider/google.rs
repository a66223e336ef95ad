//! Google Maps Geocoding API.
//!
//! Paid; requires an API key. Quota and auth failures arrive as HTTP 200
//! with a non-`OK` `status` field.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::Endpoint;
use super::{finish_forward, finish_reverse, non_empty, GeocodingProvider};
use crate::config::{ProviderSettings, GOOGLE_API_KEY_ENV, GOOGLE_BASE_URL};
use crate::error_handling::{truncate_message, GeocodingError};
use crate::models::{
    AddressComponents, GeocodingRequest, GeocodingResult, MatchType, ProviderId,
    ReverseGeocodingResult,
};

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    formatted_address: Option<String>,
    geometry: Geometry,
    #[serde(default)]
    address_components: Vec<Component>,
    #[serde(default)]
    partial_match: bool,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct Component {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

fn location_quality(location_type: Option<&str>) -> (f64, MatchType) {
    match location_type {
        Some("ROOFTOP") => (0.95, MatchType::Exact),
        Some("RANGE_INTERPOLATED") => (0.85, MatchType::Interpolated),
        Some("GEOMETRIC_CENTER") => (0.70, MatchType::Approximate),
        _ => (0.50, MatchType::Approximate),
    }
}

/// Maps a non-`OK` response status onto the error taxonomy.
fn status_error(response: &GoogleResponse) -> GeocodingError {
    let detail = match response.error_message.as_deref() {
        Some(message) => truncate_message(&format!("google {}: {message}", response.status)),
        None => format!("google {}", response.status),
    };
    match response.status.as_str() {
        "ZERO_RESULTS" => GeocodingError::NotFound(detail),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => GeocodingError::RateLimited(detail),
        "REQUEST_DENIED" => GeocodingError::AuthenticationError {
            provider: ProviderId::Google,
            reason: detail,
        },
        _ => GeocodingError::ProviderError(detail),
    }
}

fn address_components(result: &GoogleResult) -> AddressComponents {
    let find = |kind: &str| {
        result
            .address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
    };
    let long = |kind: &str| find(kind).and_then(|c| non_empty(Some(&c.long_name)));
    let short = |kind: &str| find(kind).and_then(|c| non_empty(Some(&c.short_name)));

    let street = match (long("street_number"), long("route")) {
        (Some(number), Some(route)) => Some(format!("{number} {route}")),
        (None, route) => route,
        (number, None) => number,
    };
    AddressComponents {
        formatted_address: non_empty(result.formatted_address.as_deref()),
        street,
        city: long("locality")
            .or_else(|| long("postal_town"))
            .or_else(|| long("sublocality")),
        county: long("administrative_area_level_2"),
        state: long("administrative_area_level_1"),
        state_code: short("administrative_area_level_1"),
        postal_code: long("postal_code"),
        country: long("country"),
        country_code: short("country"),
    }
}

fn first_result(response: GoogleResponse) -> Result<GoogleResult, GeocodingError> {
    if response.status != "OK" {
        return Err(status_error(&response));
    }
    response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodingError::NotFound("google returned OK with no results".to_string()))
}

fn map_geocode(
    request: &GeocodingRequest,
    response: GoogleResponse,
) -> Result<GeocodingResult, GeocodingError> {
    let best = first_result(response)?;
    let (confidence, match_type) = location_quality(best.geometry.location_type.as_deref());
    let result = GeocodingResult::success(
        request.address.clone(),
        ProviderId::Google,
        best.geometry.location.lat,
        best.geometry.location.lng,
        confidence,
        match_type,
    )
    .with_address(address_components(&best));
    Ok(if best.partial_match {
        result.into_partial()
    } else {
        result
    })
}

fn map_reverse(
    latitude: f64,
    longitude: f64,
    response: GoogleResponse,
) -> Result<ReverseGeocodingResult, GeocodingError> {
    let best = first_result(response)?;
    let (confidence, match_type) = location_quality(best.geometry.location_type.as_deref());
    Ok(ReverseGeocodingResult::success(
        latitude,
        longitude,
        ProviderId::Google,
        address_components(&best),
        confidence,
        match_type,
    ))
}

/// Adapter for the Google Geocoding `json` endpoint.
pub struct GoogleProvider {
    endpoint: Endpoint,
    api_key: String,
}

impl GoogleProvider {
    /// Fails with `AuthenticationError` when no key is configured or set in
    /// `GOOGLE_MAPS_API_KEY`.
    pub fn new(settings: &ProviderSettings) -> Result<Self, GeocodingError> {
        let api_key = settings.resolve_api_key(ProviderId::Google).ok_or_else(|| {
            GeocodingError::AuthenticationError {
                provider: ProviderId::Google,
                reason: format!("no API key configured and {GOOGLE_API_KEY_ENV} is not set"),
            }
        })?;
        Ok(Self {
            endpoint: Endpoint::new(ProviderId::Google, settings, GOOGLE_BASE_URL)?,
            api_key,
        })
    }

    async fn lookup(&self, request: &GeocodingRequest) -> Result<GeocodingResult, GeocodingError> {
        let mut url = self.endpoint.url(&["json"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("address", &request.one_line());
            if let Some(code) = request.country_code() {
                query.append_pair("components", &format!("country:{}", code.to_uppercase()));
            }
            query.append_pair("key", &self.api_key);
        }
        let response: GoogleResponse = self.endpoint.get_json(url).await?;
        map_geocode(request, response)
    }

    async fn lookup_reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReverseGeocodingResult, GeocodingError> {
        let mut url = self.endpoint.url(&["json"]);
        url.query_pairs_mut()
            .append_pair("latlng", &format!("{latitude},{longitude}"))
            .append_pair("key", &self.api_key);
        let response: GoogleResponse = self.endpoint.get_json(url).await?;
        map_reverse(latitude, longitude, response)
    }
}

#[async_trait]
impl GeocodingProvider for GoogleProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    async fn geocode(&self, request: &GeocodingRequest) -> GeocodingResult {
        let started = Instant::now();
        let outcome = self.lookup(request).await;
        finish_forward(ProviderId::Google, request, started, outcome)
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ReverseGeocodingResult {
        let started = Instant::now();
        let outcome = self.lookup_reverse(latitude, longitude).await;
        finish_reverse(ProviderId::Google, latitude, longitude, started, outcome)
    }
}
