//! HTTP client initialization.
//!
//! This module provides the function that builds each provider's HTTP client.

use std::time::Duration;

use crate::config::{ProviderSettings, TCP_CONNECT_TIMEOUT_SECS};
use reqwest::ClientBuilder;

/// Initializes an HTTP client for one provider.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the provider settings (Nominatim's usage policy
///   requires an identifying agent)
/// - Per-call timeout from the provider settings
/// - A shorter TCP connect timeout so unreachable hosts fail fast
///
/// # Arguments
///
/// * `settings` - Provider settings containing user-agent and timeout
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(settings: &ProviderSettings) -> Result<reqwest::Client, reqwest::Error> {
    let connect_timeout = Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS).min(settings.timeout());
    ClientBuilder::new()
        .timeout(settings.timeout())
        .connect_timeout(connect_timeout)
        .user_agent(settings.user_agent())
        .build()
}
