//! In-memory result cache with insertion-order eviction.
//!
//! Entries are keyed by a normalized request fingerprint. When full, the oldest
//! inserted entry is evicted regardless of how recently it was read.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::models::{GeocodingRequest, GeocodingResult};

/// Snapshot of cache counters as reported by `Pipeline::cache_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage 0-100; 0 when no lookups occurred
    pub hit_rate: f64,
}

impl CacheStats {
    /// Stats reported when caching is turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            size: 0,
            hits: 0,
            misses: 0,
            hit_rate: 0.0,
        }
    }
}

/// Normalized cache key for a request.
///
/// Lower-cased, trimmed address followed by city, state and postal code.
/// Absent disambiguators contribute empty segments so "Springfield" with and
/// without a state never collide.
pub fn fingerprint(request: &GeocodingRequest) -> String {
    fn norm(value: Option<&str>) -> String {
        value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
    }
    format!(
        "{}|{}|{}|{}",
        request.address.trim().to_lowercase(),
        norm(request.city.as_deref()),
        norm(request.state.as_deref()),
        norm(request.postal_code.as_deref()),
    )
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, GeocodingResult>,
    order: VecDeque<String>,
}

/// Bounded fingerprint → result store.
///
/// Lookups and inserts take one mutex; hit/miss counters are atomics so
/// reading stats never contends with writers.
pub struct ResultCache {
    capacity: usize,
    entries: Mutex<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// Creates an empty cache. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(Entries {
                map: HashMap::with_capacity(capacity.min(1024)),
                order: VecDeque::with_capacity(capacity.min(1024)),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    // A panic while holding the lock cannot leave map and order inconsistent
    // (each mutation is a single push/insert pair), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up a cached result, counting a hit or a miss.
    pub fn get(&self, request: &GeocodingRequest) -> Option<GeocodingResult> {
        let key = fingerprint(request);
        let found = self.lock().map.get(&key).cloned();
        match found {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(result)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores `result` for `request`.
    ///
    /// An existing key has its value replaced in place. Otherwise, when full,
    /// the oldest inserted entry is evicted first.
    pub fn set(&self, request: &GeocodingRequest, result: GeocodingResult) {
        let key = fingerprint(request);
        let mut entries = self.lock();

        if let Some(existing) = entries.map.get_mut(&key) {
            *existing = result;
            return;
        }

        while entries.map.len() >= self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.map.remove(&oldest);
            log::trace!("Evicted cache entry {}", oldest);
        }

        entries.order.push_back(key.clone());
        entries.map.insert(key, result);
    }

    /// Removes every entry. Hit/miss counters are kept.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.map.clear();
        entries.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::SeqCst);
        let misses = self.misses.load(Ordering::SeqCst);
        let lookups = hits + misses;
        // Safe cast: counters stay far below f64's exact-integer range
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64 * 100.0
        };
        CacheStats {
            enabled: true,
            size: self.len(),
            hits,
            misses,
            hit_rate,
        }
    }
}
