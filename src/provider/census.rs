//! US Census Bureau geocoder.
//!
//! Free, US-only. Coordinates are interpolated along address ranges, and the
//! `geographies` endpoints also return state/county/tract/block codes.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::Endpoint;
use super::{finish_forward, finish_reverse, non_empty, GeocodingProvider};
use crate::config::{ProviderSettings, CENSUS_BASE_URL, CENSUS_BENCHMARK, CENSUS_VINTAGE};
use crate::error_handling::GeocodingError;
use crate::models::{
    AddressComponents, AdminCodes, GeocodingRequest, GeocodingResult, MatchType, ProviderId,
    ReverseGeocodingResult,
};

const SINGLE_MATCH_CONFIDENCE: f64 = 0.90;
const MULTIPLE_MATCH_CONFIDENCE: f64 = 0.70;
const REVERSE_CONFIDENCE: f64 = 0.60;

#[derive(Debug, Deserialize)]
struct CensusResponse {
    result: CensusPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CensusPayload {
    #[serde(default)]
    address_matches: Vec<AddressMatch>,
    #[serde(default)]
    geographies: Geographies,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressMatch {
    matched_address: Option<String>,
    coordinates: Coordinates,
    #[serde(default)]
    address_components: MatchComponents,
    #[serde(default)]
    geographies: Geographies,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    x: f64,
    y: f64,
}

#[derive(Debug, Default, Deserialize)]
struct MatchComponents {
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
}

/// Layer name ("States", "Counties", "Census Tracts", "2020 Census Blocks", ...)
/// to the features in that layer. Block layer names carry a vintage prefix.
type Geographies = HashMap<String, Vec<Geography>>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct Geography {
    name: Option<String>,
    state: Option<String>,
    county: Option<String>,
    tract: Option<String>,
    block: Option<String>,
    stusab: Option<String>,
}

fn layer<'a>(geographies: &'a Geographies, suffix: &str) -> Option<&'a Geography> {
    let mut names: Vec<&String> = geographies
        .keys()
        .filter(|name| name.ends_with(suffix))
        .collect();
    // Prefer the most recent vintage ("2020 Census Blocks" over "2010 Census Blocks")
    names.sort();
    names
        .last()
        .and_then(|name| geographies.get(*name))
        .and_then(|features| features.first())
}

fn admin_codes(geographies: &Geographies) -> AdminCodes {
    let state = layer(geographies, "States");
    let county = layer(geographies, "Counties");
    let state_fips = state
        .and_then(|s| non_empty(s.state.as_deref()))
        .or_else(|| county.and_then(|c| non_empty(c.state.as_deref())));
    let county_fips = county
        .and_then(|c| non_empty(c.county.as_deref()))
        .and_then(|code| state_fips.as_ref().map(|st| format!("{st}{code}")));
    AdminCodes {
        state_fips,
        county_fips,
        tract: layer(geographies, "Census Tracts").and_then(|t| non_empty(t.tract.as_deref())),
        block: layer(geographies, "Census Blocks").and_then(|b| non_empty(b.block.as_deref())),
    }
}

fn map_match(
    request: &GeocodingRequest,
    payload: CensusPayload,
) -> Result<GeocodingResult, GeocodingError> {
    let candidates = payload.address_matches.len();
    let Some(best) = payload.address_matches.into_iter().next() else {
        return Err(GeocodingError::NotFound(format!(
            "census found no match for '{}'",
            request.address
        )));
    };

    let (confidence, match_type) = if candidates == 1 {
        (SINGLE_MATCH_CONFIDENCE, MatchType::Interpolated)
    } else {
        (MULTIPLE_MATCH_CONFIDENCE, MatchType::Approximate)
    };

    let formatted = non_empty(best.matched_address.as_deref());
    let street = formatted
        .as_deref()
        .and_then(|f| f.split(',').next())
        .and_then(|s| non_empty(Some(s)));
    let geographies = &best.geographies;
    let address = AddressComponents {
        formatted_address: formatted,
        street,
        city: non_empty(best.address_components.city.as_deref()),
        county: layer(geographies, "Counties").and_then(|c| non_empty(c.name.as_deref())),
        state: layer(geographies, "States").and_then(|s| non_empty(s.name.as_deref())),
        state_code: non_empty(best.address_components.state.as_deref()),
        postal_code: non_empty(best.address_components.zip.as_deref()),
        country: Some("United States".to_string()),
        country_code: Some("US".to_string()),
    };

    Ok(GeocodingResult::success(
        request.address.clone(),
        ProviderId::Census,
        best.coordinates.y,
        best.coordinates.x,
        confidence,
        match_type,
    )
    .with_address(address)
    .with_codes(admin_codes(geographies)))
}

fn map_reverse(
    latitude: f64,
    longitude: f64,
    payload: CensusPayload,
) -> Result<ReverseGeocodingResult, GeocodingError> {
    let geographies = &payload.geographies;
    let state = layer(geographies, "States");
    let county = layer(geographies, "Counties");
    let state_name = state.and_then(|s| non_empty(s.name.as_deref()));
    let county_name = county.and_then(|c| non_empty(c.name.as_deref()));

    let formatted = match (&county_name, &state_name) {
        (Some(c), Some(s)) => Some(format!("{c}, {s}")),
        (None, Some(s)) => Some(s.clone()),
        (Some(c), None) => Some(c.clone()),
        (None, None) => None,
    };
    if formatted.is_none() {
        return Err(GeocodingError::NotFound(format!(
            "census has no geography at ({latitude}, {longitude})"
        )));
    }

    let address = AddressComponents {
        formatted_address: formatted,
        county: county_name,
        state: state_name,
        state_code: state.and_then(|s| non_empty(s.stusab.as_deref())),
        country: Some("United States".to_string()),
        country_code: Some("US".to_string()),
        ..Default::default()
    };
    Ok(ReverseGeocodingResult::success(
        latitude,
        longitude,
        ProviderId::Census,
        address,
        REVERSE_CONFIDENCE,
        MatchType::Approximate,
    )
    .with_codes(admin_codes(geographies)))
}

/// Adapter for the Census Bureau `geographies` endpoints.
pub struct CensusProvider {
    endpoint: Endpoint,
}

impl CensusProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, GeocodingError> {
        Ok(Self {
            endpoint: Endpoint::new(ProviderId::Census, settings, CENSUS_BASE_URL)?,
        })
    }

    async fn lookup(&self, request: &GeocodingRequest) -> Result<GeocodingResult, GeocodingError> {
        let mut url = self.endpoint.url(&["geographies", "onelineaddress"]);
        url.query_pairs_mut()
            .append_pair("address", &request.one_line())
            .append_pair("benchmark", CENSUS_BENCHMARK)
            .append_pair("vintage", CENSUS_VINTAGE)
            .append_pair("format", "json");
        let response: CensusResponse = self.endpoint.get_json(url).await?;
        map_match(request, response.result)
    }

    async fn lookup_reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReverseGeocodingResult, GeocodingError> {
        let mut url = self.endpoint.url(&["geographies", "coordinates"]);
        url.query_pairs_mut()
            .append_pair("x", &longitude.to_string())
            .append_pair("y", &latitude.to_string())
            .append_pair("benchmark", CENSUS_BENCHMARK)
            .append_pair("vintage", CENSUS_VINTAGE)
            .append_pair("format", "json");
        let response: CensusResponse = self.endpoint.get_json(url).await?;
        map_reverse(latitude, longitude, response.result)
    }
}

#[async_trait]
impl GeocodingProvider for CensusProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Census
    }

    async fn geocode(&self, request: &GeocodingRequest) -> GeocodingResult {
        let started = Instant::now();
        let outcome = self.lookup(request).await;
        finish_forward(ProviderId::Census, request, started, outcome)
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ReverseGeocodingResult {
        let started = Instant::now();
        let outcome = self.lookup_reverse(latitude, longitude).await;
        finish_reverse(ProviderId::Census, latitude, longitude, started, outcome)
    }
}
