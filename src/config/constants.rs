//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the library,
//! including default thresholds, per-provider rates and timeouts, endpoint URLs,
//! and environment variable names for credentials.

// Pipeline defaults
/// Minimum confidence for a successful attempt to be accepted without trying
/// further providers.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;
/// Maximum number of cached results before the oldest insertion is evicted
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
/// Requests dispatched concurrently per batch chunk
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Country assumed when a request does not name one
pub const DEFAULT_COUNTRY: &str = "US";

// Network operation timeouts
/// Per-call timeout applied to every provider's HTTP client, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default User-Agent string for outbound provider requests.
///
/// Nominatim's usage policy rejects requests without an identifying agent, so
/// this names the library and its version. Override per provider via
/// `ProviderSettings::user_agent`.
pub const DEFAULT_USER_AGENT: &str = concat!("address_geocoder/", env!("CARGO_PKG_VERSION"));

// Per-provider request rates (requests per second)
pub const CENSUS_REQUESTS_PER_SECOND: f64 = 10.0;
/// Public Nominatim instances allow at most one request per second
pub const NOMINATIM_REQUESTS_PER_SECOND: f64 = 1.0;
pub const GOOGLE_REQUESTS_PER_SECOND: f64 = 50.0;
pub const MAPBOX_REQUESTS_PER_SECOND: f64 = 10.0;

// Provider endpoints
pub const CENSUS_BASE_URL: &str = "https://geocoding.geo.census.gov/geocoder";
/// Census address benchmark (current TIGER address ranges)
pub const CENSUS_BENCHMARK: &str = "Public_AR_Current";
/// Census geography vintage matching `CENSUS_BENCHMARK`
pub const CENSUS_VINTAGE: &str = "Current_Current";
pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const GOOGLE_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode";
pub const MAPBOX_BASE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

// Credentials
/// Environment variable consulted when no Google API key is configured
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";
/// Environment variable consulted when no Mapbox token is configured
pub const MAPBOX_ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

// Error message size limits
/// Maximum length of provider error text carried in `error_message`.
/// Longer bodies are truncated so a misbehaving provider can't bloat results
/// or the cache.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

/// HTTP status code for Too Many Requests (rate limiting)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
