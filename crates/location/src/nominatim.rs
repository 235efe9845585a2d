//! OpenStreetMap Nominatim reverse geocoder

use crate::geocoder::{Placemark, ReverseGeocoder};
use async_trait::async_trait;
use nearby_core::error::{Error, Result};
use nearby_core::Position;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Zoom level 10 resolves to city granularity
const CITY_ZOOM: &str = "10";

/// Response from the Nominatim reverse endpoint
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<ReverseAddress>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    suburb: Option<String>,
    county: Option<String>,
    state: Option<String>,
    region: Option<String>,
    province: Option<String>,
    country: Option<String>,
}

impl From<ReverseAddress> for Placemark {
    fn from(a: ReverseAddress) -> Self {
        Placemark {
            locality: a
                .city
                .or(a.town)
                .or(a.village)
                .or(a.hamlet)
                .or(a.suburb)
                .or(a.county),
            region: a.state.or(a.region).or(a.province),
            country: a.country,
        }
    }
}

/// Reverse geocoder backed by a Nominatim instance
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Create a new Nominatim geocoder
    ///
    /// # Arguments
    /// * `base_url` - Reverse endpoint, e.g. `https://nominatim.openstreetmap.org/reverse`
    /// * `user_agent` - Identifying User-Agent (required by the public instance)
    /// * `timeout_secs` - Request timeout in seconds
    pub fn new(base_url: String, user_agent: String, timeout_secs: u64) -> Result<Self> {
        info!("Initializing Nominatim geocoder at {base_url}");

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, position: &Position) -> Result<Placemark> {
        let lat = position.latitude.to_string();
        let lon = position.longitude.to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "jsonv2"),
                ("zoom", CITY_ZOOM),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("Reverse geocoding request failed: {e}");
                Error::geocoding(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::geocoding(format!("service returned {status}")));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| Error::geocoding(format!("failed to parse response: {e}")))?;

        if let Some(message) = body.error {
            debug!("Nominatim could not resolve {position}: {message}");
            return Err(Error::geocoding(message));
        }

        let placemark: Placemark = body.address.unwrap_or_default().into();
        debug!("Resolved {position} to {placemark:?}");
        Ok(placemark)
    }
}
