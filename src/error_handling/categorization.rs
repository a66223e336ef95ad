//! Error categorization for provider HTTP traffic.
//!
//! This module maps transport errors and non-success HTTP statuses onto
//! `GeocodingError`, so every adapter reports failures the same way.

use reqwest::StatusCode;

use super::types::GeocodingError;
use crate::config::{HTTP_STATUS_TOO_MANY_REQUESTS, MAX_ERROR_MESSAGE_LENGTH};
use crate::models::ProviderId;

/// Truncates provider-supplied text to `MAX_ERROR_MESSAGE_LENGTH` characters.
pub fn truncate_message(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.chars().count() <= MAX_ERROR_MESSAGE_LENGTH {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
    truncated.push_str("...");
    truncated
}

/// Categorizes a `reqwest::Error` raised while talking to `provider`.
///
/// HTTP status errors are routed through [`categorize_status`]; everything
/// else is a transport-level `ProviderError` whose message names the failure
/// kind (timeout, connect, decode, ...).
pub fn categorize_reqwest_error(provider: ProviderId, error: &reqwest::Error) -> GeocodingError {
    if let Some(status) = error.status() {
        return categorize_status(provider, status, "");
    }

    let kind = if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_decode() {
        "could not decode response"
    } else if error.is_body() {
        "could not read response body"
    } else if error.is_builder() {
        "could not build request"
    } else if error.is_redirect() {
        "too many redirects"
    } else {
        "request failed"
    };
    GeocodingError::ProviderError(truncate_message(&format!("{provider} {kind}: {error}")))
}

/// Categorizes a non-success HTTP status returned by `provider`.
///
/// - 429 → `RateLimited`
/// - 401 / 403 → `AuthenticationError` (key rejected at call time)
/// - anything else → `ProviderError`
pub fn categorize_status(provider: ProviderId, status: StatusCode, body: &str) -> GeocodingError {
    let detail = if body.trim().is_empty() {
        format!("{provider} returned HTTP {status}")
    } else {
        format!("{provider} returned HTTP {status}: {}", body.trim())
    };
    let detail = truncate_message(&detail);

    match status.as_u16() {
        HTTP_STATUS_TOO_MANY_REQUESTS => GeocodingError::RateLimited(detail),
        401 | 403 => GeocodingError::AuthenticationError {
            provider,
            reason: detail,
        },
        _ => GeocodingError::ProviderError(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_429_is_rate_limited() {
        let err = categorize_status(ProviderId::Nominatim, StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, GeocodingError::RateLimited(_)));
    }

    #[test]
    fn test_categorize_auth_statuses() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = categorize_status(ProviderId::Mapbox, status, "Not Authorized");
            match err {
                GeocodingError::AuthenticationError { provider, reason } => {
                    assert_eq!(provider, ProviderId::Mapbox);
                    assert!(reason.contains("Not Authorized"));
                }
                other => panic!("expected authentication error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_categorize_server_error() {
        let err = categorize_status(
            ProviderId::Census,
            StatusCode::SERVICE_UNAVAILABLE,
            "maintenance",
        );
        match err {
            GeocodingError::ProviderError(message) => {
                assert!(message.contains("census"));
                assert!(message.contains("503"));
                assert!(message.contains("maintenance"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncate_message() {
        let short = "short message";
        assert_eq!(truncate_message(short), short);

        let long = "x".repeat(MAX_ERROR_MESSAGE_LENGTH + 50);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_MESSAGE_LENGTH + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_message_respects_char_boundaries() {
        let long = "é".repeat(MAX_ERROR_MESSAGE_LENGTH + 1);
        let truncated = truncate_message(&long);
        assert!(truncated.starts_with('é'));
    }

    // Transport-level categorization needs a real reqwest::Error; it is covered
    // by the connection-refused test in tests/provider_http.rs.
}
