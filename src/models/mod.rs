//! Data model for requests and results.
//!
//! This module provides:
//! - `GeocodingRequest`: the caller-owned input value
//! - `GeocodingResult` / `ReverseGeocodingResult`: well-formed outcomes, including failures
//! - `BatchGeocodingResult`: ordered batch output with aggregate counts
//! - Shared enums (`ProviderId`, `MatchType`, `GeocodingStatus`)

mod batch;
mod request;
mod result;
mod types;

pub use batch::BatchGeocodingResult;
pub use request::GeocodingRequest;
pub use result::{
    valid_coordinates, AddressComponents, AdminCodes, GeocodingResult, ReverseGeocodingResult,
};
pub use types::{GeocodingStatus, MatchType, ProviderId};
