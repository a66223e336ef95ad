//! Error type definitions.
//!
//! This module defines the library's error enums and the outcome categories
//! tracked by `OutcomeStats`.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::models::{GeocodingStatus, ProviderId};

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Invalid configuration values, reported by `GeocoderConfig::validate`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Threshold outside 0.0-1.0 (or NaN).
    #[error("confidence threshold must be within 0.0-1.0, got {0}")]
    InvalidConfidenceThreshold(f64),

    /// Cache enabled with no room for entries.
    #[error("cache capacity must be at least 1 when caching is enabled")]
    InvalidCacheCapacity,

    /// Negative or non-finite request rate.
    #[error("requests per second for {provider} must be a non-negative number, got {rate}")]
    InvalidRate { provider: ProviderId, rate: f64 },

    /// Zero-second timeout.
    #[error("timeout for {provider} must be at least one second")]
    InvalidTimeout { provider: ProviderId },
}

/// Provider failures.
///
/// Adapters produce these internally and convert them into a result status at
/// their boundary; only `AuthenticationError` raised while constructing an
/// adapter ever reaches a caller, and then only to exclude that provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodingError {
    /// The provider throttled the request.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Non-success response, transport fault, timeout, or malformed body.
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Missing or rejected credential.
    #[error("authentication failed for {provider}: {reason}")]
    AuthenticationError { provider: ProviderId, reason: String },

    /// The provider answered but had no match.
    #[error("no match found: {0}")]
    NotFound(String),
}

impl GeocodingError {
    /// Result status recorded for this failure.
    pub fn status(&self) -> GeocodingStatus {
        match self {
            GeocodingError::RateLimited(_) => GeocodingStatus::RateLimited,
            GeocodingError::ProviderError(_) | GeocodingError::AuthenticationError { .. } => {
                GeocodingStatus::ProviderError
            }
            GeocodingError::NotFound(_) => GeocodingStatus::Failed,
        }
    }
}

/// Categories counted by `OutcomeStats` across pipeline calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum OutcomeType {
    // How a geocode call ended
    CacheHit,
    Accepted,       // An attempt cleared the confidence threshold
    BestEffort,     // Returned the best below-threshold attempt
    AllProvidersFailed,
    // Individual provider attempts
    AttemptRateLimited,
    AttemptProviderError,
    AttemptNoMatch,
    AttemptPanicked,
    // Batch level
    BatchTaskFailure, // Task join error converted into a synthetic result
}

impl std::fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OutcomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeType::CacheHit => "Cache hit",
            OutcomeType::Accepted => "Accepted above threshold",
            OutcomeType::BestEffort => "Best-effort below threshold",
            OutcomeType::AllProvidersFailed => "All providers failed",
            OutcomeType::AttemptRateLimited => "Provider rate limited",
            OutcomeType::AttemptProviderError => "Provider error",
            OutcomeType::AttemptNoMatch => "Provider found no match",
            OutcomeType::AttemptPanicked => "Provider panicked",
            OutcomeType::BatchTaskFailure => "Batch task failure",
        }
    }

    /// Category for a failed provider attempt with the given status.
    ///
    /// Returns `None` for statuses that carry coordinates.
    pub fn for_attempt_status(status: GeocodingStatus) -> Option<Self> {
        match status {
            GeocodingStatus::Success | GeocodingStatus::Partial => None,
            GeocodingStatus::Failed => Some(OutcomeType::AttemptNoMatch),
            GeocodingStatus::RateLimited => Some(OutcomeType::AttemptRateLimited),
            GeocodingStatus::ProviderError => Some(OutcomeType::AttemptProviderError),
        }
    }
}
