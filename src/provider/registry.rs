//! Builds the active provider set from configuration.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{CensusProvider, GeocodingProvider, GoogleProvider, MapboxProvider, NominatimProvider};
use crate::config::{GeocoderConfig, ProviderSettings};
use crate::error_handling::GeocodingError;
use crate::models::ProviderId;

/// Constructs the built-in adapter for `provider`.
///
/// # Errors
///
/// `AuthenticationError` when a paid provider has no credential;
/// `ProviderError` when the base URL or HTTP client is unusable.
pub fn build_provider(
    provider: ProviderId,
    settings: &ProviderSettings,
) -> Result<Arc<dyn GeocodingProvider>, GeocodingError> {
    Ok(match provider {
        ProviderId::Census => Arc::new(CensusProvider::new(settings)?),
        ProviderId::Nominatim => Arc::new(NominatimProvider::new(settings)?),
        ProviderId::Google => Arc::new(GoogleProvider::new(settings)?),
        ProviderId::Mapbox => Arc::new(MapboxProvider::new(settings)?),
    })
}

/// Builds every provider named in the configured order.
///
/// A provider that cannot be constructed is logged and left out; the rest
/// remain usable.
pub fn build_registry(
    config: &GeocoderConfig,
) -> BTreeMap<ProviderId, Arc<dyn GeocodingProvider>> {
    let mut registry = BTreeMap::new();
    for provider in config.provider_order() {
        match build_provider(provider, &config.settings(provider)) {
            Ok(adapter) => {
                log::debug!("Provider {} initialized", provider);
                registry.insert(provider, adapter);
            }
            Err(e) => log::warn!("Provider {} unavailable: {}", provider, e),
        }
    }
    registry
}
