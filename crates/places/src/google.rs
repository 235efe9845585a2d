//! Google Places text-search backend

use crate::backend::{PlacesBackend, TextSearchRequest};
use crate::decode::decode_text_search;
use async_trait::async_trait;
use nearby_core::error::{Error, Result};
use nearby_core::Place;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Backend for the Google Places text-search endpoint
pub struct GooglePlacesBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GooglePlacesBackend {
    /// Create a new Google Places backend
    ///
    /// # Arguments
    /// * `base_url` - Text-search endpoint URL
    /// * `api_key` - Places API key
    /// * `timeout_secs` - Request timeout in seconds
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Result<Self> {
        info!("Initializing Google Places backend");
        info!("  Endpoint: {base_url}");
        info!("  Timeout: {timeout_secs}s");

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

fn describe_send_error(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    }
}

#[async_trait]
impl PlacesBackend for GooglePlacesBackend {
    async fn text_search(&self, request: &TextSearchRequest) -> Result<Vec<Place>> {
        let request_id = request.request_id;
        let location = request.location.to_query_param();
        let radius = request.radius_m.to_string();

        debug!(request_id, "GET {} query={:?}", self.base_url, request.query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("query", request.query.as_str()),
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                // The URL carries the API key
                let e = e.without_url();
                let kind = describe_send_error(&e);
                warn!(request_id, "Places request failed ({kind}): {e}");
                Error::network(format!("{kind} error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(request_id, "Places service returned {status}: {body}");
            return Err(Error::network(format!("places service returned {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read response body: {e}")))?;

        let places = decode_text_search(&body, Some(&request.location))?;
        debug!(request_id, "Decoded {} places", places.len());
        Ok(places)
    }

    fn name(&self) -> &str {
        "google"
    }
}
