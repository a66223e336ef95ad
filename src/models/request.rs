//! Geocoding request value type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_COUNTRY;

/// A single address to resolve.
///
/// Requests are plain values: the pipeline only ever borrows them, so a caller
/// can reuse the same request for retries or batch resubmission.
///
/// # Examples
///
/// ```
/// use address_geocoder::GeocodingRequest;
///
/// let request = GeocodingRequest::new("1600 Pennsylvania Ave NW")
///     .with_city("Washington")
///     .with_state("DC")
///     .with_postal_code("20500");
/// assert_eq!(request.country, "US");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingRequest {
    /// Free-text address line
    pub address: String,
    /// City or locality
    pub city: Option<String>,
    /// State or region (name or code)
    pub state: Option<String>,
    /// Postal / ZIP code
    pub postal_code: Option<String>,
    /// Country (name or ISO code), defaults to "US"
    pub country: String,
    /// Opaque caller-visible identifier
    pub request_id: String,
    /// When the request was created
    pub created_at: DateTime<Utc>,
}

impl GeocodingRequest {
    /// Creates a request for `address` with a fresh request id.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            city: None,
            state: None,
            postal_code: None,
            country: DEFAULT_COUNTRY.to_string(),
            request_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Joins the address and every supplied locality field into one line.
    ///
    /// Empty fields are skipped, so `"123 Main St"` with city `"Springfield"`
    /// becomes `"123 Main St, Springfield"`. The country is deliberately left
    /// out: providers take it as a separate filter.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address.trim()];
        for field in [&self.city, &self.state, &self.postal_code] {
            if let Some(value) = field.as_deref().map(str::trim) {
                if !value.is_empty() {
                    parts.push(value);
                }
            }
        }
        parts.retain(|p| !p.is_empty());
        parts.join(", ")
    }

    /// Lower-cased two-letter country code when `country` looks like one.
    ///
    /// Providers that filter by ISO 3166-1 alpha-2 use this; full country
    /// names (other than the United States) return `None` and no filter is sent.
    pub fn country_code(&self) -> Option<String> {
        let country = self.country.trim();
        if country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Some(country.to_ascii_lowercase());
        }
        match country.to_ascii_lowercase().as_str() {
            "usa" | "united states" | "united states of america" => Some("us".to_string()),
            _ => None,
        }
    }
}
