//! Integration tests for the pipeline's provider fallback
//!
//! These tests verify the orchestration rules using scripted providers:
//! - Confidence acceptance and early exit
//! - Best-so-far retention and tie-breaking
//! - Exhaustion and total failure
//! - Caching, paid-only filtering and rate limiting

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use address_geocoder::{
    GeocoderConfig, GeocodingRequest, GeocodingStatus, OutcomeType, Pipeline, ProviderId,
    ProviderSettings, ALL_PROVIDERS_FAILED,
};
use helpers::{config_for, pipeline_with, pipeline_with_config, Reply, ScriptedProvider};

use ProviderId::{Census, Google, Mapbox, Nominatim};

fn request() -> GeocodingRequest {
    GeocodingRequest::new("350 Fifth Avenue")
        .with_city("New York")
        .with_state("NY")
}

#[tokio::test]
async fn test_accepts_first_result_above_threshold() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.90));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.99));
    let pipeline = pipeline_with(&[&census, &nominatim]);

    let result = pipeline.geocode(&request(), false).await;

    assert!(result.is_success());
    assert_eq!(result.provider, Some(Census));
    assert_eq!(result.confidence, 0.90);
    assert_eq!(census.calls(), 1);
    assert_eq!(nominatim.calls(), 0, "later providers must not be called");
    assert_eq!(pipeline.outcome_stats().get(OutcomeType::Accepted), 1);
}

#[tokio::test]
async fn test_threshold_is_inclusive() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.75));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.99));
    let pipeline = pipeline_with(&[&census, &nominatim]);

    let result = pipeline.geocode(&request(), false).await;
    assert_eq!(result.provider, Some(Census));
    assert_eq!(nominatim.calls(), 0);
}

#[tokio::test]
async fn test_falls_back_past_failing_provider() {
    let census = ScriptedProvider::always(Census, Reply::Fail(GeocodingStatus::ProviderError));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.85));
    let pipeline = pipeline_with(&[&census, &nominatim]);

    let result = pipeline.geocode(&request(), false).await;
    assert_eq!(result.provider, Some(Nominatim));
    assert_eq!(result.status, GeocodingStatus::Success);
    assert_eq!(
        pipeline
            .outcome_stats()
            .get(OutcomeType::AttemptProviderError),
        1
    );
}

#[tokio::test]
async fn test_best_so_far_prefers_higher_confidence() {
    // 0.60 then 0.55
    let census = ScriptedProvider::always(Census, Reply::Hit(0.60));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.55));
    let result = pipeline_with(&[&census, &nominatim])
        .geocode(&request(), false)
        .await;
    assert_eq!(result.provider, Some(Census));
    assert_eq!(result.confidence, 0.60);

    // 0.55 then 0.60
    let census = ScriptedProvider::always(Census, Reply::Hit(0.55));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.60));
    let result = pipeline_with(&[&census, &nominatim])
        .geocode(&request(), false)
        .await;
    assert_eq!(result.provider, Some(Nominatim));
    assert_eq!(result.confidence, 0.60);
}

#[tokio::test]
async fn test_exact_tie_keeps_first_tried() {
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.50));
    let census = ScriptedProvider::always(Census, Reply::Hit(0.50));
    let result = pipeline_with(&[&nominatim, &census])
        .geocode(&request(), false)
        .await;
    assert_eq!(result.provider, Some(Nominatim));
    assert_eq!(census.calls(), 1);
}

#[tokio::test]
async fn test_exhaustion_returns_best_with_original_status() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.3));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Partial(0.5));
    let google = ScriptedProvider::always(Google, Reply::Hit(0.4));
    let pipeline = pipeline_with(&[&census, &nominatim, &google]);

    let result = pipeline.geocode(&request(), false).await;

    assert_eq!(result.provider, Some(Nominatim));
    assert_eq!(result.confidence, 0.5);
    assert_eq!(result.status, GeocodingStatus::Partial);
    assert!(result.has_coordinates());
    assert_eq!(google.calls(), 1);
    assert_eq!(pipeline.outcome_stats().get(OutcomeType::BestEffort), 1);
}

#[tokio::test]
async fn test_partial_above_threshold_is_not_accepted_early() {
    let census = ScriptedProvider::always(Census, Reply::Partial(0.95));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.80));
    let result = pipeline_with(&[&census, &nominatim])
        .geocode(&request(), false)
        .await;
    assert_eq!(result.provider, Some(Nominatim));
    assert_eq!(result.status, GeocodingStatus::Success);
}

#[tokio::test]
async fn test_total_failure_returns_synthetic_result() {
    let census = ScriptedProvider::always(Census, Reply::Panic);
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Panic);
    let pipeline = pipeline_with(&[&census, &nominatim]);

    let result = pipeline.geocode(&request(), false).await;

    assert_eq!(result.status, GeocodingStatus::Failed);
    assert_eq!(result.confidence, 0.0);
    assert!(result.latitude.is_none());
    assert!(result.longitude.is_none());
    assert_eq!(result.provider, None);
    assert_eq!(result.error_message.as_deref(), Some(ALL_PROVIDERS_FAILED));
    assert_eq!(result.original_address, "350 Fifth Avenue");

    let stats = pipeline.outcome_stats();
    assert_eq!(stats.get(OutcomeType::AttemptPanicked), 2);
    assert_eq!(stats.get(OutcomeType::AllProvidersFailed), 1);
}

#[tokio::test]
async fn test_failed_attempts_keep_first_provider_status() {
    let census = ScriptedProvider::always(Census, Reply::Fail(GeocodingStatus::RateLimited));
    let nominatim =
        ScriptedProvider::always(Nominatim, Reply::Fail(GeocodingStatus::ProviderError));
    let pipeline = pipeline_with(&[&census, &nominatim]);

    let result = pipeline.geocode(&request(), false).await;

    assert_eq!(result.status, GeocodingStatus::RateLimited);
    assert_eq!(result.provider, Some(Census));
    assert_eq!(result.confidence, 0.0);
    assert!(result.latitude.is_none());
    assert_ne!(result.error_message.as_deref(), Some(ALL_PROVIDERS_FAILED));
    assert_eq!(nominatim.calls(), 1);

    let stats = pipeline.outcome_stats();
    assert_eq!(stats.get(OutcomeType::AttemptRateLimited), 1);
    assert_eq!(stats.get(OutcomeType::AttemptProviderError), 1);
    assert_eq!(stats.get(OutcomeType::AllProvidersFailed), 1);
}

#[tokio::test]
async fn test_panic_then_no_match_returns_no_match() {
    let census = ScriptedProvider::always(Census, Reply::Panic);
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Fail(GeocodingStatus::Failed));
    let result = pipeline_with(&[&census, &nominatim])
        .geocode(&request(), false)
        .await;

    assert_eq!(result.status, GeocodingStatus::Failed);
    assert_eq!(result.provider, Some(Nominatim));
}

#[tokio::test]
async fn test_coordinates_beat_earlier_failure() {
    let census = ScriptedProvider::always(Census, Reply::Fail(GeocodingStatus::RateLimited));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Partial(0.4));
    let result = pipeline_with(&[&census, &nominatim])
        .geocode(&request(), false)
        .await;

    assert_eq!(result.status, GeocodingStatus::Partial);
    assert_eq!(result.provider, Some(Nominatim));
}

#[tokio::test]
async fn test_panicking_provider_is_skipped() {
    let census = ScriptedProvider::always(Census, Reply::Panic);
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.85));
    let result = pipeline_with(&[&census, &nominatim])
        .geocode(&request(), false)
        .await;
    assert_eq!(result.provider, Some(Nominatim));
    assert!(result.is_success());
}

#[tokio::test]
async fn test_identical_requests_call_provider_once() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.9));
    let pipeline = pipeline_with(&[&census]);

    let first = pipeline.geocode(&request(), false).await;
    let second = pipeline.geocode(&request(), false).await;

    assert_eq!(census.calls(), 1);
    assert_eq!(first, second);
    let stats = pipeline.cache_stats();
    assert!(stats.enabled);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hit_rate, 50.0);
}

#[tokio::test]
async fn test_cache_key_ignores_case_and_whitespace() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.9));
    let pipeline = pipeline_with(&[&census]);

    pipeline.geocode(&request(), false).await;
    let shouted = GeocodingRequest::new("  350 FIFTH AVENUE ")
        .with_city("new york")
        .with_state("ny");
    pipeline.geocode(&shouted, false).await;

    assert_eq!(census.calls(), 1);
}

#[tokio::test]
async fn test_failures_are_cached() {
    let census = ScriptedProvider::always(Census, Reply::Fail(GeocodingStatus::ProviderError));
    let pipeline = pipeline_with(&[&census]);

    let first = pipeline.geocode(&request(), false).await;
    let second = pipeline.geocode(&request(), false).await;

    assert_eq!(first.status, GeocodingStatus::ProviderError);
    assert_eq!(first, second);
    assert_eq!(census.calls(), 1);
}

#[tokio::test]
async fn test_clear_cache_forces_new_lookup() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.9));
    let pipeline = pipeline_with(&[&census]);

    pipeline.geocode(&request(), false).await;
    pipeline.clear_cache();
    pipeline.geocode(&request(), false).await;

    assert_eq!(census.calls(), 2);
    assert_eq!(pipeline.cache_stats().size, 1);
}

#[tokio::test]
async fn test_disabled_cache_always_calls_providers() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.9));
    let config = GeocoderConfig {
        enable_cache: false,
        ..config_for(&[Census])
    };
    let pipeline = pipeline_with_config(config, &[&census]);

    pipeline.geocode(&request(), false).await;
    pipeline.geocode(&request(), false).await;

    assert_eq!(census.calls(), 2);
    assert!(!pipeline.cache_stats().enabled);
}

#[tokio::test]
async fn test_require_paid_skips_free_providers() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.95));
    let google = ScriptedProvider::always(Google, Reply::Hit(0.80));
    let pipeline = pipeline_with(&[&census, &google]);

    let result = pipeline.geocode(&request(), true).await;

    assert_eq!(result.provider, Some(Google));
    assert_eq!(census.calls(), 0);
}

#[tokio::test]
async fn test_require_paid_without_paid_providers() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.95));
    let pipeline = pipeline_with(&[&census]);

    let result = pipeline.geocode(&request(), true).await;

    assert_eq!(result.status, GeocodingStatus::Failed);
    assert_eq!(result.error_message.as_deref(), Some(ALL_PROVIDERS_FAILED));
    assert_eq!(census.calls(), 0);
}

#[tokio::test]
async fn test_duplicate_fallbacks_are_tried_once() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.3));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.2));
    let config = GeocoderConfig {
        fallback_providers: vec![Nominatim, Census, Nominatim],
        ..config_for(&[Census, Nominatim])
    };
    let pipeline = pipeline_with_config(config, &[&census, &nominatim]);

    pipeline.geocode(&request(), false).await;

    assert_eq!(census.calls(), 1);
    assert_eq!(nominatim.calls(), 1);
}

#[tokio::test]
async fn test_available_providers_reflects_constructed_set() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.9));
    let mapbox = ScriptedProvider::always(Mapbox, Reply::Hit(0.9));
    // Nominatim is configured but has no adapter
    let config = config_for(&[Mapbox, Nominatim, Census]);
    let pipeline = pipeline_with_config(config, &[&census, &mapbox]);

    assert_eq!(pipeline.available_providers(), vec![Mapbox, Census]);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = GeocoderConfig {
        confidence_threshold: 1.5,
        ..GeocoderConfig::default()
    };
    assert!(Pipeline::new(config).is_err());

    let config = GeocoderConfig {
        cache_capacity: 0,
        ..GeocoderConfig::default()
    };
    assert!(Pipeline::with_providers(config, Vec::new()).is_err());
}

#[tokio::test]
async fn test_reverse_geocode_returns_first_success() {
    let census = ScriptedProvider::always(Census, Reply::Fail(GeocodingStatus::Failed));
    let nominatim = ScriptedProvider::always(Nominatim, Reply::Hit(0.7));
    let pipeline = pipeline_with(&[&census, &nominatim]);

    let result = pipeline.reverse_geocode(40.7484, -73.9857).await;

    assert!(result.is_success());
    assert_eq!(result.provider, Some(Nominatim));
    assert_eq!(result.latitude, 40.7484);
    assert_eq!(census.calls(), 1);
}

#[tokio::test]
async fn test_reverse_geocode_rejects_invalid_coordinates() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.9));
    let pipeline = pipeline_with(&[&census]);

    let result = pipeline.reverse_geocode(123.0, 0.0).await;

    assert_eq!(result.status, GeocodingStatus::Failed);
    assert_eq!(census.calls(), 0);
}

#[tokio::test]
async fn test_reverse_geocode_total_failure() {
    let census = ScriptedProvider::always(Census, Reply::Panic);
    let pipeline = pipeline_with(&[&census]);

    let result = pipeline.reverse_geocode(10.0, 10.0).await;

    assert_eq!(result.status, GeocodingStatus::Failed);
    assert_eq!(result.error_message.as_deref(), Some(ALL_PROVIDERS_FAILED));
}

#[tokio::test(start_paused = true)]
async fn test_provider_calls_are_rate_limited() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.9));
    let mut config = config_for(&[Census]);
    config.providers.insert(
        Census,
        ProviderSettings {
            requests_per_second: Some(2.0),
            ..Default::default()
        },
    );
    let pipeline = pipeline_with_config(config, &[&census]);

    let start = tokio::time::Instant::now();
    for street in ["1 Main St", "2 Main St", "3 Main St"] {
        pipeline.geocode(&GeocodingRequest::new(street), false).await;
    }

    assert_eq!(census.calls(), 3);
    assert!(start.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_cache_hits_are_not_rate_limited() {
    let census = ScriptedProvider::always(Census, Reply::Hit(0.9));
    let mut config = config_for(&[Census]);
    config.providers.insert(
        Census,
        ProviderSettings {
            requests_per_second: Some(0.1),
            ..Default::default()
        },
    );
    let pipeline = Arc::new(pipeline_with_config(config, &[&census]));

    let start = tokio::time::Instant::now();
    for _ in 0..5 {
        pipeline.geocode(&request(), false).await;
    }

    assert_eq!(census.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}
