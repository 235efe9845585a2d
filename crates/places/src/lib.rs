//! Place search for nearby search
//!
//! This crate provides:
//! - [`PlaceSearchClient`]: issues cancellable text searches around a position
//! - [`PlacesBackend`]: the seam to a places service, with a Google Places
//!   implementation and a scripted mock for tests
//! - Response decoding that tolerates individual malformed results

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use nearby_core::config::Config;
use nearby_core::error::{Error, Result};
use std::sync::Arc;
use tracing::info;

mod backend;
mod client;
pub mod decode;
mod google;
mod mock;

pub use backend::{PlacesBackend, TextSearchRequest};
pub use client::{PlaceSearchClient, SearchCanceller, SearchHandle, SearchOutcome};
pub use google::GooglePlacesBackend;
pub use mock::{MockPlacesBackend, MockReply};

/// Create the places backend described by the configuration
///
/// # Errors
/// `Error::Config` if no API key is configured
pub fn create_places_backend(config: &Config) -> Result<Arc<dyn PlacesBackend>> {
    let api_key = config.places_api_key().ok_or_else(|| {
        Error::config(
            "Places API key required. Set places.api_key, NEARBY_PLACES_API_KEY or GOOGLE_PLACES_API_KEY"
                .to_string(),
        )
    })?;

    info!("Creating Google Places backend");
    let backend = GooglePlacesBackend::new(
        config.places.base_url.clone(),
        api_key,
        config.places.timeout_secs,
    )?;
    Ok(Arc::new(backend))
}

/// Create a search client for the configured backend and radius
pub fn create_places_client(config: &Config) -> Result<PlaceSearchClient> {
    let backend = create_places_backend(config)?;
    Ok(PlaceSearchClient::new(backend, config.places.radius_m))
}
