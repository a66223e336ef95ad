//! Error handling and outcome statistics.
//!
//! This module provides:
//! - Error type definitions (`GeocodingError`, `ConfigError`, `InitializationError`)
//! - Categorization of HTTP transport errors and statuses
//! - Outcome statistics tracking across pipeline calls
//!
//! Provider failures never escape as errors: adapters turn a `GeocodingError`
//! into a result status at their boundary.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, categorize_status, truncate_message};
pub use stats::OutcomeStats;
pub use types::{ConfigError, GeocodingError, InitializationError, OutcomeType};
