//! OpenStreetMap Nominatim geocoder.
//!
//! The public instance allows one request per second and requires an
//! identifying User-Agent. Self-hosted instances are reached by overriding
//! `base_url`.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::Endpoint;
use super::{finish_forward, finish_reverse, non_empty, GeocodingProvider};
use crate::config::{ProviderSettings, NOMINATIM_BASE_URL};
use crate::error_handling::GeocodingError;
use crate::models::{
    AddressComponents, GeocodingRequest, GeocodingResult, MatchType, ProviderId,
    ReverseGeocodingResult,
};

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: Option<String>,
    #[serde(default)]
    place_rank: u32,
    #[serde(default)]
    address: HashMap<String, String>,
}

/// `/reverse` answers with either a place or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    Place(Place),
    Error { error: String },
}

/// Confidence and match type from the place's rank in the OSM hierarchy.
fn rank_quality(place_rank: u32) -> (f64, MatchType) {
    match place_rank {
        30..=u32::MAX => (0.85, MatchType::Exact),
        26..=29 => (0.70, MatchType::Interpolated),
        _ => (0.50, MatchType::Approximate),
    }
}

fn address_components(place: &Place) -> AddressComponents {
    let get = |key: &str| non_empty(place.address.get(key).map(String::as_str));
    let street = match (get("house_number"), get("road")) {
        (Some(number), Some(road)) => Some(format!("{number} {road}")),
        (None, road) => road,
        (number, None) => number,
    };
    // "ISO3166-2-lvl4": "US-CA" → "CA"
    let state_code = place
        .address
        .iter()
        .find(|(key, _)| key.starts_with("ISO3166-2"))
        .and_then(|(_, code)| code.rsplit('-').next())
        .and_then(|code| non_empty(Some(code)));

    AddressComponents {
        formatted_address: non_empty(place.display_name.as_deref()),
        street,
        city: get("city")
            .or_else(|| get("town"))
            .or_else(|| get("village"))
            .or_else(|| get("hamlet")),
        county: get("county"),
        state: get("state"),
        state_code,
        postal_code: get("postcode"),
        country: get("country"),
        country_code: get("country_code").map(|c| c.to_ascii_uppercase()),
    }
}

fn coordinates(place: &Place) -> Result<(f64, f64), GeocodingError> {
    let latitude = place.lat.trim().parse::<f64>();
    let longitude = place.lon.trim().parse::<f64>();
    match (latitude, longitude) {
        (Ok(lat), Ok(lon)) => Ok((lat, lon)),
        _ => Err(GeocodingError::ProviderError(format!(
            "nominatim returned unparseable coordinates ({}, {})",
            place.lat, place.lon
        ))),
    }
}

fn map_search(
    request: &GeocodingRequest,
    places: Vec<Place>,
) -> Result<GeocodingResult, GeocodingError> {
    let Some(place) = places.into_iter().next() else {
        return Err(GeocodingError::NotFound(format!(
            "nominatim found no match for '{}'",
            request.address
        )));
    };
    let (latitude, longitude) = coordinates(&place)?;
    let (confidence, match_type) = rank_quality(place.place_rank);
    Ok(GeocodingResult::success(
        request.address.clone(),
        ProviderId::Nominatim,
        latitude,
        longitude,
        confidence,
        match_type,
    )
    .with_address(address_components(&place)))
}

fn map_reverse(
    latitude: f64,
    longitude: f64,
    response: ReverseResponse,
) -> Result<ReverseGeocodingResult, GeocodingError> {
    let place = match response {
        ReverseResponse::Place(place) => place,
        ReverseResponse::Error { error } => {
            return Err(GeocodingError::NotFound(format!("nominatim: {error}")))
        }
    };
    let (confidence, match_type) = rank_quality(place.place_rank);
    Ok(ReverseGeocodingResult::success(
        latitude,
        longitude,
        ProviderId::Nominatim,
        address_components(&place),
        confidence,
        match_type,
    ))
}

/// Adapter for the Nominatim `/search` and `/reverse` endpoints.
pub struct NominatimProvider {
    endpoint: Endpoint,
}

impl NominatimProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, GeocodingError> {
        Ok(Self {
            endpoint: Endpoint::new(ProviderId::Nominatim, settings, NOMINATIM_BASE_URL)?,
        })
    }

    async fn search(&self, request: &GeocodingRequest) -> Result<GeocodingResult, GeocodingError> {
        let mut url = self.endpoint.url(&["search"]);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", &request.one_line())
                .append_pair("format", "jsonv2")
                .append_pair("addressdetails", "1")
                .append_pair("limit", "1");
            if let Some(code) = request.country_code() {
                query.append_pair("countrycodes", &code);
            }
        }
        let places: Vec<Place> = self.endpoint.get_json(url).await?;
        map_search(request, places)
    }

    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReverseGeocodingResult, GeocodingError> {
        let mut url = self.endpoint.url(&["reverse"]);
        url.query_pairs_mut()
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string())
            .append_pair("format", "jsonv2")
            .append_pair("addressdetails", "1");
        let response: ReverseResponse = self.endpoint.get_json(url).await?;
        map_reverse(latitude, longitude, response)
    }
}

#[async_trait]
impl GeocodingProvider for NominatimProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Nominatim
    }

    async fn geocode(&self, request: &GeocodingRequest) -> GeocodingResult {
        let started = Instant::now();
        let outcome = self.search(request).await;
        finish_forward(ProviderId::Nominatim, request, started, outcome)
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ReverseGeocodingResult {
        let started = Instant::now();
        let outcome = self.reverse(latitude, longitude).await;
        finish_reverse(ProviderId::Nominatim, latitude, longitude, started, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILDING: &str = r#"[{
        "place_id": 1,
        "lat": "37.4224858",
        "lon": "-122.0855846",
        "display_name": "1600, Amphitheatre Parkway, Mountain View, Santa Clara County, California, 94043, United States",
        "place_rank": 30,
        "address": {
            "house_number": "1600",
            "road": "Amphitheatre Parkway",
            "city": "Mountain View",
            "county": "Santa Clara County",
            "state": "California",
            "ISO3166-2-lvl4": "US-CA",
            "postcode": "94043",
            "country": "United States",
            "country_code": "us"
        }
    }]"#;

    #[test]
    fn test_rank_quality_table() {
        assert_eq!(rank_quality(30), (0.85, MatchType::Exact));
        assert_eq!(rank_quality(26), (0.70, MatchType::Interpolated));
        assert_eq!(rank_quality(29), (0.70, MatchType::Interpolated));
        assert_eq!(rank_quality(16), (0.50, MatchType::Approximate));
    }

    #[test]
    fn test_building_match() {
        let places: Vec<Place> = serde_json::from_str(BUILDING).unwrap();
        let result = map_search(&GeocodingRequest::new("1600 Amphitheatre Pkwy"), places).unwrap();

        assert!(result.is_success());
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.latitude, Some(37.4224858));
        assert_eq!(result.address.street.as_deref(), Some("1600 Amphitheatre Parkway"));
        assert_eq!(result.address.city.as_deref(), Some("Mountain View"));
        assert_eq!(result.address.state_code.as_deref(), Some("CA"));
        assert_eq!(result.address.country_code.as_deref(), Some("US"));
    }

    #[test]
    fn test_town_used_when_no_city() {
        let json = r#"[{"lat": "44.0", "lon": "-72.0", "place_rank": 26,
            "address": {"road": "Elm St", "town": "Bradford"}}]"#;
        let places: Vec<Place> = serde_json::from_str(json).unwrap();
        let result = map_search(&GeocodingRequest::new("Elm St"), places).unwrap();
        assert_eq!(result.address.city.as_deref(), Some("Bradford"));
        assert_eq!(result.address.street.as_deref(), Some("Elm St"));
        assert_eq!(result.match_type, MatchType::Interpolated);
    }

    #[test]
    fn test_empty_search_is_not_found() {
        let err = map_search(&GeocodingRequest::new("zzz"), Vec::new()).unwrap_err();
        assert!(matches!(err, GeocodingError::NotFound(_)));
    }

    #[test]
    fn test_bad_coordinates_are_provider_error() {
        let json = r#"[{"lat": "north", "lon": "-72.0", "place_rank": 30}]"#;
        let places: Vec<Place> = serde_json::from_str(json).unwrap();
        let err = map_search(&GeocodingRequest::new("x"), places).unwrap_err();
        assert!(matches!(err, GeocodingError::ProviderError(_)));
    }

    #[test]
    fn test_reverse_error_body() {
        let response: ReverseResponse =
            serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        let err = map_reverse(0.0, 0.0, response).unwrap_err();
        assert!(matches!(err, GeocodingError::NotFound(_)));
    }
}
