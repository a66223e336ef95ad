//! Shared resource setup.
//!
//! This module provides functions to initialize the resources the pipeline
//! and its embedding application share:
//! - HTTP clients (with timeouts and user agent)
//! - Per-provider rate limiters
//! - Logger
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;
mod rate_limiter;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use rate_limiter::{init_rate_limiter, RateLimiter};
