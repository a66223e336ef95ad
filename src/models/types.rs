//! Shared enumerations for geocoding results.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Built-in geocoding providers.
///
/// The string form (`"census"`, `"nominatim"`, `"google"`, `"mapbox"`) is used in
/// configuration, logs, and serialized results.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderId {
    /// US Census Bureau geocoder (free, US only)
    Census,
    /// OpenStreetMap Nominatim (free, 1 request/second public policy)
    Nominatim,
    /// Google Maps Geocoding API (paid, API key)
    Google,
    /// Mapbox Geocoding API (paid, access token)
    Mapbox,
}

impl ProviderId {
    /// Whether the provider bills per request and needs a credential.
    pub fn is_paid(&self) -> bool {
        matches!(self, ProviderId::Google | ProviderId::Mapbox)
    }
}

/// Coarse precision of a match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchType {
    /// Rooftop / parcel level
    Exact,
    /// Centroid or area level
    #[default]
    Approximate,
    /// Interpolated along an address range
    Interpolated,
}

/// Outcome of a single geocoding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeocodingStatus {
    /// Coordinates resolved
    Success,
    /// Coordinates resolved, but the provider only matched part of the input
    Partial,
    /// The provider answered but found no usable match
    Failed,
    /// The provider throttled the request
    RateLimited,
    /// Non-success response, transport fault, or malformed body
    ProviderError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_provider_id_round_trips_through_string() {
        for provider in ProviderId::iter() {
            let name = provider.to_string();
            assert_eq!(ProviderId::from_str(&name).unwrap(), provider);
        }
        assert_eq!(ProviderId::from_str("Google").unwrap(), ProviderId::Google);
        assert!(ProviderId::from_str("bing").is_err());
    }

    #[test]
    fn test_paid_providers() {
        let paid: Vec<_> = ProviderId::iter().filter(|p| p.is_paid()).collect();
        assert_eq!(paid, vec![ProviderId::Google, ProviderId::Mapbox]);
    }

    #[test]
    fn test_status_display_is_snake_case() {
        assert_eq!(GeocodingStatus::RateLimited.to_string(), "rate_limited");
        assert_eq!(GeocodingStatus::ProviderError.to_string(), "provider_error");
        assert_eq!(MatchType::Interpolated.to_string(), "interpolated");
    }
}
