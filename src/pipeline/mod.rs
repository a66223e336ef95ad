//! Geocoding pipeline: cache lookup, ordered provider fallback and
//! confidence arbitration.
//!
//! Providers are tried strictly in sequence within one call. Each attempt is
//! preceded by that provider's rate limiter. The first attempt that succeeds
//! with confidence at or above the threshold is accepted; otherwise the
//! highest-confidence attempt is returned with its own status, earlier
//! providers winning ties. Only when no attempt completed (every provider
//! panicked, or none was eligible) is a synthetic failure returned.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::cache::{CacheStats, ResultCache};
use crate::config::GeocoderConfig;
use crate::error_handling::{ConfigError, OutcomeStats, OutcomeType};
use crate::initialization::{init_rate_limiter, RateLimiter};
use crate::models::{
    valid_coordinates, GeocodingRequest, GeocodingResult, GeocodingStatus, ProviderId,
    ReverseGeocodingResult,
};
use crate::provider::{build_registry, GeocodingProvider};

/// Message carried by the synthetic result returned when no provider attempt
/// completed.
pub const ALL_PROVIDERS_FAILED: &str = "all providers failed";

/// Multi-provider geocoding pipeline.
///
/// Share it as `Arc<Pipeline>`; every method takes `&self` and the cache,
/// limiters and counters synchronize internally.
///
/// # Examples
///
/// ```no_run
/// use address_geocoder::{GeocoderConfig, GeocodingRequest, Pipeline};
///
/// # async fn run() -> Result<(), address_geocoder::ConfigError> {
/// let pipeline = Pipeline::new(GeocoderConfig::default())?;
/// let request = GeocodingRequest::new("1600 Pennsylvania Ave NW")
///     .with_city("Washington")
///     .with_state("DC");
/// let result = pipeline.geocode(&request, false).await;
/// if result.is_success() {
///     println!("{:?}, {:?}", result.latitude, result.longitude);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    config: GeocoderConfig,
    providers: BTreeMap<ProviderId, Arc<dyn GeocodingProvider>>,
    limiters: BTreeMap<ProviderId, Arc<RateLimiter>>,
    cache: Option<ResultCache>,
    stats: OutcomeStats,
}

impl Pipeline {
    /// Validates `config` and constructs every configured provider.
    ///
    /// Providers that cannot be constructed (e.g. a paid provider with no
    /// credential) are logged and excluded; check
    /// [`Pipeline::available_providers`].
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the configuration is invalid.
    pub fn new(config: GeocoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let providers = build_registry(&config);
        Ok(Self::assemble(config, providers))
    }

    /// Builds a pipeline around caller-supplied adapters.
    ///
    /// Adapters are keyed by [`GeocodingProvider::id`]; the attempt order still
    /// comes from `config`, so an adapter whose id is not in the configured
    /// order is never consulted.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the configuration is invalid.
    pub fn with_providers(
        config: GeocoderConfig,
        adapters: Vec<Arc<dyn GeocodingProvider>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let providers = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Ok(Self::assemble(config, providers))
    }

    fn assemble(
        config: GeocoderConfig,
        providers: BTreeMap<ProviderId, Arc<dyn GeocodingProvider>>,
    ) -> Self {
        let limiters = providers
            .keys()
            .map(|&id| {
                let rate = config.settings(id).rate_for(id);
                (id, init_rate_limiter(rate))
            })
            .collect();
        let cache = config
            .enable_cache
            .then(|| ResultCache::new(config.cache_capacity));

        log::info!(
            "Geocoding pipeline ready: providers [{}], threshold {}, cache {}",
            providers
                .keys()
                .map(ProviderId::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            config.confidence_threshold,
            if config.enable_cache { "on" } else { "off" }
        );

        Self {
            config,
            providers,
            limiters,
            cache,
            stats: OutcomeStats::new(),
        }
    }

    /// Constructed providers in attempt order.
    fn attempt_order(
        &self,
        require_paid: bool,
    ) -> Vec<(ProviderId, Arc<dyn GeocodingProvider>)> {
        self.config
            .provider_order()
            .into_iter()
            .filter(|id| !require_paid || id.is_paid())
            .filter_map(|id| self.providers.get(&id).map(|p| (id, Arc::clone(p))))
            .collect()
    }

    async fn throttle(&self, provider: ProviderId) {
        if let Some(limiter) = self.limiters.get(&provider) {
            limiter.wait().await;
        }
    }

    /// Resolves one address.
    ///
    /// Never fails: provider faults, panics and exhaustion all produce a
    /// well-formed result. When `require_paid` is set only paid providers are
    /// consulted. Whatever is returned is cached (when caching is enabled).
    pub async fn geocode(
        &self,
        request: &GeocodingRequest,
        require_paid: bool,
    ) -> GeocodingResult {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(request) {
                log::debug!("Cache hit for '{}'", request.address);
                self.stats.increment(OutcomeType::CacheHit);
                return hit;
            }
        }

        let threshold = self.config.confidence_threshold;
        let mut accepted = None;
        let mut best: Option<GeocodingResult> = None;

        for (id, provider) in self.attempt_order(require_paid) {
            self.throttle(id).await;

            let attempt = match AssertUnwindSafe(provider.geocode(request))
                .catch_unwind()
                .await
            {
                Ok(attempt) => attempt,
                Err(_) => {
                    log::warn!("Provider {} panicked geocoding '{}'", id, request.address);
                    self.stats.increment(OutcomeType::AttemptPanicked);
                    continue;
                }
            };
            log::debug!(
                "{} → {} (confidence {:.2}) for '{}'",
                id,
                attempt.status,
                attempt.confidence,
                request.address
            );
            if let Some(outcome) = OutcomeType::for_attempt_status(attempt.status) {
                self.stats.increment(outcome);
            }

            if attempt.is_success() && attempt.confidence >= threshold {
                accepted = Some(attempt);
                break;
            }
            let better = best
                .as_ref()
                .map_or(true, |kept| attempt.confidence > kept.confidence);
            if better {
                best = Some(attempt);
            }
        }

        let result = if let Some(result) = accepted {
            self.stats.increment(OutcomeType::Accepted);
            result
        } else if let Some(result) = best {
            log::debug!(
                "No provider cleared {} for '{}'; returning {} from {:?}",
                threshold,
                request.address,
                result.status,
                result.provider
            );
            if result.has_coordinates() {
                self.stats.increment(OutcomeType::BestEffort);
            } else {
                self.stats.increment(OutcomeType::AllProvidersFailed);
            }
            result
        } else {
            log::info!("No provider answered for '{}'", request.address);
            self.stats.increment(OutcomeType::AllProvidersFailed);
            GeocodingResult::failure(
                request.address.clone(),
                None,
                GeocodingStatus::Failed,
                ALL_PROVIDERS_FAILED,
            )
        };

        if let Some(cache) = &self.cache {
            cache.set(request, result.clone());
        }
        result
    }

    /// Resolves coordinates to an address.
    ///
    /// Out-of-range coordinates short-circuit to a `failed` result. Providers
    /// are tried in order until one succeeds. Reverse results are not cached.
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ReverseGeocodingResult {
        if !valid_coordinates(latitude, longitude) {
            return ReverseGeocodingResult::failure(
                latitude,
                longitude,
                None,
                GeocodingStatus::Failed,
                format!("invalid coordinates ({latitude}, {longitude})"),
            );
        }

        for (id, provider) in self.attempt_order(false) {
            self.throttle(id).await;

            match AssertUnwindSafe(provider.reverse_geocode(latitude, longitude))
                .catch_unwind()
                .await
            {
                Ok(attempt) if attempt.is_success() => return attempt,
                Ok(attempt) => {
                    if let Some(outcome) = OutcomeType::for_attempt_status(attempt.status) {
                        self.stats.increment(outcome);
                    }
                }
                Err(_) => {
                    log::warn!("Provider {} panicked reverse geocoding", id);
                    self.stats.increment(OutcomeType::AttemptPanicked);
                }
            }
        }

        self.stats.increment(OutcomeType::AllProvidersFailed);
        ReverseGeocodingResult::failure(
            latitude,
            longitude,
            None,
            GeocodingStatus::Failed,
            ALL_PROVIDERS_FAILED,
        )
    }

    /// Providers that were successfully constructed, in attempt order.
    pub fn available_providers(&self) -> Vec<ProviderId> {
        self.config
            .provider_order()
            .into_iter()
            .filter(|id| self.providers.contains_key(id))
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .as_ref()
            .map_or_else(CacheStats::disabled, ResultCache::stats)
    }

    /// Drops every cached result. Hit/miss counters are kept.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            log::info!("Geocoding cache cleared");
        }
    }

    pub fn outcome_stats(&self) -> &OutcomeStats {
        &self.stats
    }

    pub(crate) fn record(&self, outcome: OutcomeType) {
        self.stats.increment(outcome);
    }

    /// Writes cache and outcome counters to the log.
    pub fn log_statistics(&self) {
        let cache = self.cache_stats();
        if cache.enabled {
            log::info!(
                "Cache: {} entries, {} hits, {} misses ({:.1}% hit rate)",
                cache.size,
                cache.hits,
                cache.misses,
                cache.hit_rate
            );
        }
        self.stats.log_summary();
    }

    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }
}
