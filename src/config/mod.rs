//! Library configuration and constants.
//!
//! This module provides:
//! - Configuration constants (thresholds, rates, timeouts, endpoints)
//! - `GeocoderConfig` and per-provider `ProviderSettings`
//! - Logging level/format types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{GeocoderConfig, LogFormat, ProviderSettings};
