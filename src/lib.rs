//! address_geocoder library: multi-provider address geocoding
//!
//! This library turns free-text addresses into coordinates by consulting
//! several external geocoding services (US Census, Nominatim, Google Maps,
//! Mapbox) in a configured order, arbitrating among their answers by
//! confidence, caching results, and running batches with bounded concurrency.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use address_geocoder::{GeocoderConfig, GeocodingRequest, Pipeline, ProviderId};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeocoderConfig {
//!     preferred_provider: ProviderId::Census,
//!     fallback_providers: vec![ProviderId::Nominatim],
//!     ..Default::default()
//! };
//! let pipeline = Arc::new(Pipeline::new(config)?);
//!
//! let requests = vec![
//!     GeocodingRequest::new("1600 Pennsylvania Ave NW").with_city("Washington").with_state("DC"),
//!     GeocodingRequest::new("350 Fifth Avenue").with_city("New York").with_state("NY"),
//! ];
//! let batch = pipeline.geocode_batch(&requests, 50, true).await;
//! println!("Geocoded {} of {} ({:.1}%)",
//!          batch.success_count, batch.total_count, batch.success_rate());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod batch;
mod cache;
pub mod config;
mod error_handling;
pub mod initialization;
mod models;
mod pipeline;
pub mod provider;

// Re-export public API
pub use batch::BatchRunner;
pub use cache::{fingerprint, CacheStats, ResultCache};
pub use config::{GeocoderConfig, LogFormat, ProviderSettings};
pub use error_handling::{
    ConfigError, GeocodingError, InitializationError, OutcomeStats, OutcomeType,
};
pub use initialization::{init_logger_with, RateLimiter};
pub use models::{
    valid_coordinates, AddressComponents, AdminCodes, BatchGeocodingResult, GeocodingRequest,
    GeocodingResult, GeocodingStatus, MatchType, ProviderId, ReverseGeocodingResult,
};
pub use pipeline::{Pipeline, ALL_PROVIDERS_FAILED};
pub use provider::GeocodingProvider;
