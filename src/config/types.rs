//! Configuration types.
//!
//! This module defines the structs and enums a caller uses to configure the
//! pipeline. Everything is passed explicitly to `Pipeline::new`; there is no
//! process-wide configuration state.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::config::constants::*;
use crate::error_handling::ConfigError;
use crate::models::ProviderId;

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Per-provider connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API key / access token. Paid providers fall back to their environment
    /// variable when this is `None` or blank.
    pub api_key: Option<String>,
    /// Maximum request rate (0 disables throttling); `None` uses the
    /// provider's default rate
    pub requests_per_second: Option<f64>,
    /// Per-call timeout in seconds
    pub timeout_seconds: u64,
    /// Override for the provider endpoint (self-hosted instances, test servers)
    pub base_url: Option<String>,
    /// Override for the User-Agent header
    pub user_agent: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            requests_per_second: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            base_url: None,
            user_agent: None,
        }
    }
}

impl ProviderSettings {
    /// Configured rate, or the default rate for `provider`.
    pub fn rate_for(&self, provider: ProviderId) -> f64 {
        self.requests_per_second.unwrap_or(match provider {
            ProviderId::Census => CENSUS_REQUESTS_PER_SECOND,
            ProviderId::Nominatim => NOMINATIM_REQUESTS_PER_SECOND,
            ProviderId::Google => GOOGLE_REQUESTS_PER_SECOND,
            ProviderId::Mapbox => MAPBOX_REQUESTS_PER_SECOND,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Configured base URL or `default`, without a trailing slash.
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    /// Resolves the credential for `provider`.
    ///
    /// An explicitly configured non-blank key wins; otherwise the provider's
    /// environment variable is consulted. Free providers have no variable.
    pub fn resolve_api_key(&self, provider: ProviderId) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
        let env_var = match provider {
            ProviderId::Google => GOOGLE_API_KEY_ENV,
            ProviderId::Mapbox => MAPBOX_ACCESS_TOKEN_ENV,
            ProviderId::Census | ProviderId::Nominatim => return None,
        };
        std::env::var(env_var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Library configuration for the geocoding pipeline.
///
/// # Examples
///
/// ```
/// use address_geocoder::{GeocoderConfig, ProviderId};
///
/// let config = GeocoderConfig {
///     preferred_provider: ProviderId::Nominatim,
///     fallback_providers: vec![ProviderId::Census],
///     confidence_threshold: 0.8,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Provider tried first
    pub preferred_provider: ProviderId,
    /// Providers tried after the preferred one, in order
    pub fallback_providers: Vec<ProviderId>,
    /// Minimum confidence (0.0-1.0) for accepting an attempt immediately
    pub confidence_threshold: f64,
    /// Whether results are cached
    pub enable_cache: bool,
    /// Maximum cached entries
    pub cache_capacity: usize,
    /// Per-provider settings; missing providers use `ProviderSettings::defaults_for`
    pub providers: BTreeMap<ProviderId, ProviderSettings>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            preferred_provider: ProviderId::Census,
            fallback_providers: vec![
                ProviderId::Nominatim,
                ProviderId::Google,
                ProviderId::Mapbox,
            ],
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            enable_cache: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            providers: BTreeMap::new(),
        }
    }
}

impl GeocoderConfig {
    /// Settings for `provider`; unset fields keep their defaults.
    pub fn settings(&self, provider: ProviderId) -> ProviderSettings {
        self.providers
            .get(&provider)
            .cloned()
            .unwrap_or_default()
    }

    /// Preferred provider followed by fallbacks, duplicates removed.
    pub fn provider_order(&self) -> Vec<ProviderId> {
        let mut order = Vec::with_capacity(self.fallback_providers.len() + 1);
        let candidates = std::iter::once(self.preferred_provider)
            .chain(self.fallback_providers.iter().copied());
        for provider in candidates {
            if !order.contains(&provider) {
                order.push(provider);
            }
        }
        order
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.confidence_threshold)
        {
            return Err(ConfigError::InvalidConfidenceThreshold(
                self.confidence_threshold,
            ));
        }
        if self.enable_cache && self.cache_capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity);
        }
        for provider in self.provider_order() {
            let settings = self.settings(provider);
            let rate = settings.rate_for(provider);
            if !rate.is_finite() || rate < 0.0 {
                return Err(ConfigError::InvalidRate { provider, rate });
            }
            if settings.timeout_seconds == 0 {
                return Err(ConfigError::InvalidTimeout { provider });
            }
        }
        Ok(())
    }
}
