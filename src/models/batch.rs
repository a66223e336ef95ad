//! Batch geocoding results and summary statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::GeocodingResult;
use super::types::{GeocodingStatus, ProviderId};

/// Results of a batch run, in input order, with aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchGeocodingResult {
    /// One result per input request, same order as the input
    pub results: Vec<GeocodingResult>,
    pub total_count: usize,
    pub success_count: usize,
    /// Every result that is neither `success` nor `partial`
    pub failed_count: usize,
    pub partial_count: usize,
    /// Results attributed to each provider (synthetic results are not counted)
    pub provider_counts: BTreeMap<ProviderId, usize>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl BatchGeocodingResult {
    /// Aggregates counts with a single pass over `results`.
    pub fn from_results(
        results: Vec<GeocodingResult>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let mut success_count = 0;
        let mut failed_count = 0;
        let mut partial_count = 0;
        let mut provider_counts = BTreeMap::new();

        for result in &results {
            match result.status {
                GeocodingStatus::Success if result.is_success() => success_count += 1,
                GeocodingStatus::Partial => partial_count += 1,
                _ => failed_count += 1,
            }
            if let Some(provider) = result.provider {
                *provider_counts.entry(provider).or_insert(0) += 1;
            }
        }

        let duration_seconds = (end_time - start_time)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Self {
            total_count: results.len(),
            results,
            success_count,
            failed_count,
            partial_count,
            provider_counts,
            start_time,
            end_time,
            duration_seconds,
        }
    }

    /// Percentage of successful results; 0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_count as f64 * 100.0
        }
    }
}
