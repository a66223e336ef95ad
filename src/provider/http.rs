//! Shared HTTP plumbing for provider adapters.

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ProviderSettings;
use crate::error_handling::{
    categorize_reqwest_error, categorize_status, truncate_message, GeocodingError,
};
use crate::initialization::init_client;
use crate::models::ProviderId;

/// A provider's HTTP client bound to its base URL.
pub(crate) struct Endpoint {
    provider: ProviderId,
    client: Client,
    base_url: Url,
}

impl Endpoint {
    /// Builds the client and validates the (possibly overridden) base URL.
    pub(crate) fn new(
        provider: ProviderId,
        settings: &ProviderSettings,
        default_base_url: &str,
    ) -> Result<Self, GeocodingError> {
        let raw = settings.base_url_or(default_base_url);
        let base_url = Url::parse(&raw).map_err(|e| {
            GeocodingError::ProviderError(format!("invalid base URL for {provider} ({raw}): {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GeocodingError::ProviderError(format!(
                "invalid base URL for {provider}: {raw}"
            )));
        }
        let client = init_client(settings).map_err(|e| {
            GeocodingError::ProviderError(format!("could not build HTTP client for {provider}: {e}"))
        })?;
        Ok(Self {
            provider,
            client,
            base_url,
        })
    }

    /// Base URL with `segments` appended; each segment is percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can carry path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Issues a GET and decodes a JSON body.
    ///
    /// Non-2xx statuses are categorized from the status code and body; URLs
    /// are stripped from transport errors since they may carry credentials.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GeocodingError> {
        log::debug!("{} GET {}", self.provider, url.path());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(self.provider, &e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| categorize_reqwest_error(self.provider, &e.without_url()))?;

        if !status.is_success() {
            return Err(categorize_status(self.provider, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            GeocodingError::ProviderError(truncate_message(&format!(
                "{} returned a malformed response: {e}",
                self.provider
            )))
        })
    }
}
