//! Outcome statistics tracking.
//!
//! This module provides thread-safe counters for how geocode calls and
//! individual provider attempts ended.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::OutcomeType;

/// Thread-safe outcome statistics tracker.
///
/// Uses atomic counters so concurrent batch tasks can record outcomes without
/// locking. All outcome types are initialized to zero on creation.
pub struct OutcomeStats {
    counts: HashMap<OutcomeType, AtomicUsize>,
}

impl Default for OutcomeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeStats {
    pub fn new() -> Self {
        let mut counts = HashMap::new();
        for outcome in OutcomeType::iter() {
            counts.insert(outcome, AtomicUsize::new(0));
        }
        OutcomeStats { counts }
    }

    /// Increment an outcome counter.
    pub fn increment(&self, outcome: OutcomeType) {
        if let Some(counter) = self.counts.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment outcome counter for {:?} which is not in the map. \
                 This indicates a bug in OutcomeStats initialization.",
                outcome
            );
        }
    }

    /// Get the count for an outcome type.
    pub fn get(&self, outcome: OutcomeType) -> usize {
        self.counts
            .get(&outcome)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total across all outcome types.
    pub fn total(&self) -> usize {
        OutcomeType::iter().map(|o| self.get(o)).sum()
    }

    /// Non-zero counters, in declaration order.
    pub fn snapshot(&self) -> Vec<(OutcomeType, usize)> {
        OutcomeType::iter()
            .map(|o| (o, self.get(o)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Writes every non-zero counter to the log.
    pub fn log_summary(&self) {
        let total = self.total();
        if total == 0 {
            return;
        }
        log::info!("Geocoding outcome counts ({} total):", total);
        for (outcome, count) in self.snapshot() {
            log::info!("   {}: {}", outcome.as_str(), count);
        }
    }
}
