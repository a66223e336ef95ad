//! Forward and reverse geocoding results.

use serde::{Deserialize, Serialize};

use super::types::{GeocodingStatus, MatchType, ProviderId};

/// Returns true when `latitude`/`longitude` are finite and within WGS84 bounds.
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Normalized address components shared by forward and reverse results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub formatted_address: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    /// Two-letter state / region code (e.g. "CA")
    pub state_code: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2, upper case
    pub country_code: Option<String>,
}

/// Administrative geography codes, passed through when a provider returns them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminCodes {
    pub state_fips: Option<String>,
    pub county_fips: Option<String>,
    pub tract: Option<String>,
    pub block: Option<String>,
}

/// Result of resolving one address.
///
/// A result is always well formed, even when every provider failed: check
/// [`GeocodingResult::is_success`] before reading coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingResult {
    pub original_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub address: AddressComponents,
    #[serde(flatten)]
    pub codes: AdminCodes,
    pub confidence: f64,
    pub match_type: MatchType,
    /// `None` for results synthesized by the pipeline itself
    pub provider: Option<ProviderId>,
    pub status: GeocodingStatus,
    pub error_message: Option<String>,
    pub response_time_ms: u64,
}

impl GeocodingResult {
    /// Builds a successful result.
    ///
    /// Coordinates outside WGS84 bounds never produce a success: the result is
    /// downgraded to [`GeocodingStatus::Failed`] with no coordinates.
    pub fn success(
        original_address: impl Into<String>,
        provider: ProviderId,
        latitude: f64,
        longitude: f64,
        confidence: f64,
        match_type: MatchType,
    ) -> Self {
        let original_address = original_address.into();
        if !valid_coordinates(latitude, longitude) {
            return Self::failure(
                original_address,
                Some(provider),
                GeocodingStatus::Failed,
                format!("provider returned invalid coordinates ({latitude}, {longitude})"),
            );
        }
        Self {
            original_address,
            latitude: Some(latitude),
            longitude: Some(longitude),
            address: AddressComponents::default(),
            codes: AdminCodes::default(),
            confidence: clamp_confidence(confidence),
            match_type,
            provider: Some(provider),
            status: GeocodingStatus::Success,
            error_message: None,
            response_time_ms: 0,
        }
    }

    /// Builds a result with no coordinates and zero confidence.
    pub fn failure(
        original_address: impl Into<String>,
        provider: Option<ProviderId>,
        status: GeocodingStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            original_address: original_address.into(),
            latitude: None,
            longitude: None,
            address: AddressComponents::default(),
            codes: AdminCodes::default(),
            confidence: 0.0,
            match_type: MatchType::Approximate,
            provider,
            status,
            error_message: Some(message.into()),
            response_time_ms: 0,
        }
    }

    pub fn with_address(mut self, address: AddressComponents) -> Self {
        self.address = address;
        self
    }

    pub fn with_codes(mut self, codes: AdminCodes) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_response_time(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    /// Marks a successful match as partial. Other statuses are left untouched.
    pub fn into_partial(mut self) -> Self {
        if self.status == GeocodingStatus::Success {
            self.status = GeocodingStatus::Partial;
        }
        self
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// `status == success` and both coordinates present.
    pub fn is_success(&self) -> bool {
        self.status == GeocodingStatus::Success && self.has_coordinates()
    }
}

/// Result of resolving a coordinate pair to an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocodingResult {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub address: AddressComponents,
    #[serde(flatten)]
    pub codes: AdminCodes,
    pub confidence: f64,
    pub match_type: MatchType,
    pub provider: Option<ProviderId>,
    pub status: GeocodingStatus,
    pub error_message: Option<String>,
    pub response_time_ms: u64,
}

impl ReverseGeocodingResult {
    pub fn success(
        latitude: f64,
        longitude: f64,
        provider: ProviderId,
        address: AddressComponents,
        confidence: f64,
        match_type: MatchType,
    ) -> Self {
        Self {
            latitude,
            longitude,
            address,
            codes: AdminCodes::default(),
            confidence: clamp_confidence(confidence),
            match_type,
            provider: Some(provider),
            status: GeocodingStatus::Success,
            error_message: None,
            response_time_ms: 0,
        }
    }

    pub fn failure(
        latitude: f64,
        longitude: f64,
        provider: Option<ProviderId>,
        status: GeocodingStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            address: AddressComponents::default(),
            codes: AdminCodes::default(),
            confidence: 0.0,
            match_type: MatchType::Approximate,
            provider,
            status,
            error_message: Some(message.into()),
            response_time_ms: 0,
        }
    }

    pub fn with_codes(mut self, codes: AdminCodes) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_response_time(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    /// `status == success` and an address was produced.
    pub fn is_success(&self) -> bool {
        self.status == GeocodingStatus::Success && self.address.formatted_address.is_some()
    }
}
