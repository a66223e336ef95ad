//! Mapbox Geocoding API (v5, `mapbox.places`).
//!
//! Paid; requires an access token. The search text travels in the URL path,
//! so it is percent-encoded as a single path segment.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::Endpoint;
use super::{finish_forward, finish_reverse, non_empty, GeocodingProvider};
use crate::config::{ProviderSettings, MAPBOX_ACCESS_TOKEN_ENV, MAPBOX_BASE_URL};
use crate::error_handling::GeocodingError;
use crate::models::{
    AddressComponents, GeocodingRequest, GeocodingResult, MatchType, ProviderId,
    ReverseGeocodingResult,
};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    place_name: Option<String>,
    relevance: Option<f64>,
    /// `[longitude, latitude]`
    center: [f64; 2],
    /// House number for address features
    address: Option<String>,
    /// Feature name (the street, for address features)
    text: Option<String>,
    #[serde(default)]
    place_type: Vec<String>,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    context: Vec<ContextEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    accuracy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    /// "<layer>.<id>", e.g. "region.9007"
    id: String,
    text: String,
    short_code: Option<String>,
}

fn accuracy_quality(accuracy: Option<&str>) -> (f64, MatchType) {
    match accuracy {
        Some("rooftop" | "parcel" | "point") => (0.95, MatchType::Exact),
        Some("interpolated") => (0.85, MatchType::Interpolated),
        Some("intersection" | "street") => (0.75, MatchType::Approximate),
        _ => (0.60, MatchType::Approximate),
    }
}

fn feature_quality(feature: &Feature) -> (f64, MatchType) {
    let (base, match_type) = accuracy_quality(feature.properties.accuracy.as_deref());
    let relevance = feature.relevance.unwrap_or(1.0).clamp(0.0, 1.0);
    (base * relevance, match_type)
}

fn address_components(feature: &Feature) -> AddressComponents {
    let layer = |name: &str| {
        feature
            .context
            .iter()
            .find(|entry| entry.id.split('.').next() == Some(name))
    };
    let text = |name: &str| layer(name).and_then(|entry| non_empty(Some(&entry.text)));

    let is_address = feature.place_type.iter().any(|t| t == "address");
    let street = if is_address {
        match (non_empty(feature.address.as_deref()), non_empty(feature.text.as_deref())) {
            (Some(number), Some(name)) => Some(format!("{number} {name}")),
            (None, name) => name,
            (number, None) => number,
        }
    } else {
        None
    };
    // region short_code is "US-CA"; country short_code is "us"
    let state_code = layer("region")
        .and_then(|entry| entry.short_code.as_deref())
        .and_then(|code| code.rsplit('-').next())
        .and_then(|code| non_empty(Some(code)))
        .map(|code| code.to_ascii_uppercase());
    let country_code = layer("country")
        .and_then(|entry| non_empty(entry.short_code.as_deref()))
        .map(|code| code.to_ascii_uppercase());

    AddressComponents {
        formatted_address: non_empty(feature.place_name.as_deref()),
        street,
        city: text("place").or_else(|| text("locality")),
        county: text("district"),
        state: text("region"),
        state_code,
        postal_code: text("postcode"),
        country: text("country"),
        country_code,
    }
}

fn first_feature(collection: FeatureCollection, what: &str) -> Result<Feature, GeocodingError> {
    collection
        .features
        .into_iter()
        .next()
        .ok_or_else(|| GeocodingError::NotFound(format!("mapbox found no match for {what}")))
}

fn map_geocode(
    request: &GeocodingRequest,
    collection: FeatureCollection,
) -> Result<GeocodingResult, GeocodingError> {
    let feature = first_feature(collection, &format!("'{}'", request.address))?;
    let (confidence, match_type) = feature_quality(&feature);
    let [longitude, latitude] = feature.center;
    Ok(GeocodingResult::success(
        request.address.clone(),
        ProviderId::Mapbox,
        latitude,
        longitude,
        confidence,
        match_type,
    )
    .with_address(address_components(&feature)))
}

fn map_reverse(
    latitude: f64,
    longitude: f64,
    collection: FeatureCollection,
) -> Result<ReverseGeocodingResult, GeocodingError> {
    let feature = first_feature(collection, &format!("({latitude}, {longitude})"))?;
    let (confidence, match_type) = feature_quality(&feature);
    Ok(ReverseGeocodingResult::success(
        latitude,
        longitude,
        ProviderId::Mapbox,
        address_components(&feature),
        confidence,
        match_type,
    ))
}

/// Adapter for the Mapbox `mapbox.places` endpoint.
pub struct MapboxProvider {
    endpoint: Endpoint,
    access_token: String,
}

impl MapboxProvider {
    /// Fails with `AuthenticationError` when no token is configured or set in
    /// `MAPBOX_ACCESS_TOKEN`.
    pub fn new(settings: &ProviderSettings) -> Result<Self, GeocodingError> {
        let access_token = settings.resolve_api_key(ProviderId::Mapbox).ok_or_else(|| {
            GeocodingError::AuthenticationError {
                provider: ProviderId::Mapbox,
                reason: format!("no access token configured and {MAPBOX_ACCESS_TOKEN_ENV} is not set"),
            }
        })?;
        Ok(Self {
            endpoint: Endpoint::new(ProviderId::Mapbox, settings, MAPBOX_BASE_URL)?,
            access_token,
        })
    }

    async fn lookup(&self, request: &GeocodingRequest) -> Result<GeocodingResult, GeocodingError> {
        let segment = format!("{}.json", request.one_line());
        let mut url = self.endpoint.url(&[&segment]);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("access_token", &self.access_token)
                .append_pair("limit", "1");
            if let Some(code) = request.country_code() {
                query.append_pair("country", &code);
            }
        }
        let collection: FeatureCollection = self.endpoint.get_json(url).await?;
        map_geocode(request, collection)
    }

    async fn lookup_reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReverseGeocodingResult, GeocodingError> {
        let segment = format!("{longitude},{latitude}.json");
        let mut url = self.endpoint.url(&[&segment]);
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .append_pair("limit", "1");
        let collection: FeatureCollection = self.endpoint.get_json(url).await?;
        map_reverse(latitude, longitude, collection)
    }
}

#[async_trait]
impl GeocodingProvider for MapboxProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Mapbox
    }

    async fn geocode(&self, request: &GeocodingRequest) -> GeocodingResult {
        let started = Instant::now();
        let outcome = self.lookup(request).await;
        finish_forward(ProviderId::Mapbox, request, started, outcome)
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ReverseGeocodingResult {
        let started = Instant::now();
        let outcome = self.lookup_reverse(latitude, longitude).await;
        finish_reverse(ProviderId::Mapbox, latitude, longitude, started, outcome)
    }
}
