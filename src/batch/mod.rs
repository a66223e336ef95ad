//! Batch geocoding.
//!
//! Requests are processed in consecutive chunks. Every request in a chunk runs
//! as its own Tokio task; the chunk is joined in input order before the next
//! one starts, so at most `batch_size` requests are in flight.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinError;

use crate::config::DEFAULT_BATCH_SIZE;
use crate::error_handling::OutcomeType;
use crate::models::{BatchGeocodingResult, GeocodingRequest, GeocodingResult, GeocodingStatus};
use crate::pipeline::Pipeline;

/// Runs batches of requests through a shared pipeline.
pub struct BatchRunner {
    pipeline: Arc<Pipeline>,
    batch_size: usize,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: false,
        }
    }

    /// Requests dispatched concurrently per chunk. 0 is treated as 1.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Log a progress line after each chunk.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Geocodes every request, returning results in input order.
    ///
    /// A request whose task fails becomes a `provider_error` result at its
    /// position; the batch itself never fails.
    pub async fn run(&self, requests: &[GeocodingRequest]) -> BatchGeocodingResult {
        let start_time = Utc::now();
        let started = Instant::now();
        let total = requests.len();
        let mut results = Vec::with_capacity(total);

        log::info!(
            "Geocoding {} requests in chunks of {}",
            total,
            self.batch_size
        );

        for chunk in requests.chunks(self.batch_size) {
            let handles = chunk.iter().cloned().map(|request| {
                let pipeline = Arc::clone(&self.pipeline);
                tokio::spawn(async move { pipeline.geocode(&request, false).await })
            });
            let joined = join_all(handles).await;
            results.extend(self.collect_chunk(chunk, joined));

            if self.show_progress {
                log_progress(started, results.len(), total);
            }
        }

        let batch = BatchGeocodingResult::from_results(results, start_time, Utc::now());
        log::info!(
            "Batch complete: {} succeeded, {} partial, {} failed of {} ({:.1}%) in {:.2}s",
            batch.success_count,
            batch.partial_count,
            batch.failed_count,
            batch.total_count,
            batch.success_rate(),
            batch.duration_seconds
        );
        batch
    }

    /// Pairs each joined task with its request, converting join errors.
    fn collect_chunk(
        &self,
        chunk: &[GeocodingRequest],
        joined: Vec<Result<GeocodingResult, JoinError>>,
    ) -> Vec<GeocodingResult> {
        chunk
            .iter()
            .zip(joined)
            .map(|(request, outcome)| match outcome {
                Ok(result) => result,
                Err(join_error) => {
                    log::warn!("Task panicked: {:?}", join_error);
                    self.pipeline.record(OutcomeType::BatchTaskFailure);
                    task_failure(request, &join_error)
                }
            })
            .collect()
    }
}

fn task_failure(request: &GeocodingRequest, join_error: &JoinError) -> GeocodingResult {
    let reason = if join_error.is_panic() {
        "task panicked"
    } else {
        "task cancelled"
    };
    GeocodingResult::failure(
        request.address.clone(),
        None,
        GeocodingStatus::ProviderError,
        format!("geocoding {reason}"),
    )
}

/// Logs progress information about batch processing.
fn log_progress(started: Instant, completed: usize, total: usize) {
    let elapsed_secs = started.elapsed().as_secs_f64();
    // Safe cast: request counts are far below f64's exact-integer range
    #[allow(clippy::cast_precision_loss)]
    let rate = if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs
    } else {
        0.0
    };
    log::info!(
        "Geocoded {}/{} requests in {:.2} seconds (~{:.2} requests/sec)",
        completed,
        total,
        elapsed_secs,
        rate
    );
}

impl Pipeline {
    /// Geocodes `requests` in chunks of `batch_size` (0 is treated as 1).
    ///
    /// Shorthand for [`BatchRunner`] with the given settings.
    pub async fn geocode_batch(
        self: &Arc<Self>,
        requests: &[GeocodingRequest],
        batch_size: usize,
        show_progress: bool,
    ) -> BatchGeocodingResult {
        BatchRunner::new(Arc::clone(self))
            .with_batch_size(batch_size)
            .with_progress(show_progress)
            .run(requests)
            .await
    }
}
