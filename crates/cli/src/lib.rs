//! Library interface for the nearby CLI
//!
//! Pipeline assembly and output formatting live here so they can be tested
//! without running the binary.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{anyhow, Context};
use nearby_coordinator::{CoordinatorHandle, CoordinatorSettings, SearchCoordinator};
use nearby_core::{OpenNow, Place, Position, SearchPhase, SearchState};
use nearby_location::{create_geocoder, FixedLocationPlatform, PositionProvider};
use std::sync::Arc;
use tracing::info;

// Re-export commonly needed types for tests
pub use anyhow::Result;
pub use nearby_core::config::Config;

/// Pick the search origin: explicit flags win over the `[location]` section
pub fn resolve_coordinates(
    config: &Config,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Position> {
    let (lat, lng) = match (latitude, longitude) {
        (Some(lat), Some(lng)) => (lat, lng),
        (None, None) => config.location.fixed_coordinates().ok_or_else(|| {
            anyhow!("No location available. Pass --lat and --lng or set [location] in the config")
        })?,
        _ => return Err(anyhow!("--lat and --lng must be given together")),
    };

    let position = Position::new(lat, lng);
    if !position.is_valid() {
        return Err(anyhow!("Invalid coordinates: {lat}, {lng}"));
    }
    Ok(position)
}

/// Start a position provider reporting `origin`
pub async fn start_provider(config: &Config, origin: Position) -> Result<PositionProvider> {
    let (platform, events) = FixedLocationPlatform::new(origin.latitude, origin.longitude);
    let geocoder = create_geocoder(&config.geocoder).context("Failed to create geocoder")?;
    let provider = PositionProvider::new(Arc::new(platform), events, geocoder).await;
    provider.request_permission().await;
    provider.start_locating().await;
    Ok(provider)
}

/// Start a coordinator fed by `provider`
pub fn start_coordinator(config: &Config, provider: &PositionProvider) -> Result<CoordinatorHandle> {
    let client = nearby_places::create_places_client(config)
        .context("Failed to create places client")?;
    info!("Search radius: {}m", client.radius_m());
    Ok(SearchCoordinator::spawn(
        Arc::new(client),
        provider.feed(),
        CoordinatorSettings::from(&config.search),
    ))
}

/// Whether a search has reached a state worth reporting
pub fn is_settled(state: &SearchState) -> bool {
    match state.phase {
        SearchPhase::Completed | SearchPhase::Failed => true,
        SearchPhase::Idle => state.last_error.is_some(),
        SearchPhase::Debouncing | SearchPhase::Searching => false,
    }
}

/// One numbered result, with its details on a second line
pub fn format_place(index: usize, place: &Place) -> String {
    let mut title = format!("{index}. {}", place.name());
    if let Some(rating) = place.rating() {
        title.push_str(&format!(" [{rating:.1}]"));
    }

    let mut details = Vec::new();
    if !place.address().is_empty() {
        details.push(place.address().to_string());
    }
    match place.open_now() {
        OpenNow::Open => details.push("open now".to_string()),
        OpenNow::Closed => details.push("closed".to_string()),
        OpenNow::Unknown => {}
    }
    if let Some(km) = place.distance_km() {
        details.push(format!("{km:.1} km"));
    }

    if details.is_empty() {
        title
    } else {
        format!("{title}\n   {}", details.join(" | "))
    }
}

/// Status line for a search state
pub fn format_status(state: &SearchState) -> String {
    if let Some(message) = state.user_message() {
        return message.to_string();
    }
    match state.phase {
        SearchPhase::Idle => "Type at least a few characters to search.".to_string(),
        SearchPhase::Debouncing if state.is_loading => "Waiting...".to_string(),
        SearchPhase::Debouncing => String::new(),
        SearchPhase::Searching => format!("Searching for \"{}\"...", state.query.trim()),
        SearchPhase::Completed => format!("{} places found.", state.results.len()),
        SearchPhase::Failed => "Search failed.".to_string(),
    }
}

/// Full listing for a settled search
pub fn format_results(state: &SearchState) -> String {
    let mut lines = vec![format_status(state)];
    lines.extend(
        state
            .results
            .iter()
            .enumerate()
            .map(|(i, place)| format_place(i + 1, place)),
    );
    lines.join("\n")
}
