//! Configuration module for nearby
//!
//! This module provides configuration structures and loading mechanisms.
//! Configuration can be loaded from TOML files and/or environment variables.

mod defaults;
mod loading;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use defaults::*;

/// Largest accepted search radius in meters (upstream maximum)
pub const MAX_RADIUS_M: u32 = 50_000;

/// Largest accepted debounce delay in milliseconds
pub const MAX_DEBOUNCE_MS: u64 = 5_000;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.nearby/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".nearby").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Debounce and gating policy
    #[serde(default)]
    pub search: SearchConfig,

    /// Places API configuration
    #[serde(default)]
    pub places: PlacesConfig,

    /// Location source configuration
    #[serde(default)]
    pub location: LocationConfig,

    /// Reverse geocoding configuration
    #[serde(default)]
    pub geocoder: GeocoderConfig,
}

/// Debounce and gating policy for the search coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search is issued
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Minimum trimmed query length before any search is issued
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,
}

impl SearchConfig {
    pub fn debounce_duration(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Places text-search API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Text-search endpoint
    #[serde(default = "default_places_base_url")]
    pub base_url: String,

    /// API credential (or use NEARBY_PLACES_API_KEY / GOOGLE_PLACES_API_KEY env vars)
    pub api_key: Option<String>,

    /// Search radius around the current position in meters (default: 5000)
    #[serde(default = "default_radius_m")]
    pub radius_m: u32,

    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_places_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for PlacesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacesConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("radius_m", &self.radius_m)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Location source configuration
///
/// When both coordinates are set, the fixed platform reports them instead of
/// a device fix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Fixed coordinates, if fully configured
    pub fn fixed_coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Reverse geocoding configuration
///
/// # Providers
/// - `nominatim` (default): OpenStreetMap Nominatim reverse endpoint
/// - `none`: skip reverse lookup, keep the coordinate label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Provider type: "nominatim" (default) or "none"
    #[serde(default = "default_geocoder_provider")]
    pub provider: String,

    /// Reverse endpoint
    #[serde(default = "default_geocoder_base_url")]
    pub base_url: String,

    /// User-Agent sent with every lookup (required by Nominatim usage policy)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds (default: 5)
    #[serde(default = "default_geocoder_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_length: default_min_query_length(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: default_places_base_url(),
            api_key: None,
            radius_m: default_radius_m(),
            timeout_secs: default_places_timeout_secs(),
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: default_geocoder_provider(),
            base_url: default_geocoder_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoder_timeout_secs(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.search.min_query_length == 0 {
            return Err(Error::config(
                "search.min_query_length must be greater than 0".to_string(),
            ));
        }
        if self.search.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(Error::config(format!(
                "search.debounce_ms too large (max {MAX_DEBOUNCE_MS}, got {})",
                self.search.debounce_ms
            )));
        }

        if self.places.radius_m == 0 || self.places.radius_m > MAX_RADIUS_M {
            return Err(Error::config(format!(
                "places.radius_m must be between 1 and {MAX_RADIUS_M} (got {})",
                self.places.radius_m
            )));
        }
        if self.places.timeout_secs == 0 {
            return Err(Error::config(
                "places.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.places.base_url.trim().is_empty() {
            return Err(Error::config("places.base_url must not be empty".to_string()));
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err(Error::config(format!(
                        "location coordinates out of range: ({lat}, {lng})"
                    )));
                }
            }
            (None, None) => {}
            _ => {
                return Err(Error::config(
                    "location.latitude and location.longitude must be set together".to_string(),
                ));
            }
        }

        let valid_geocoders = ["nominatim", "none"];
        if !valid_geocoders.contains(&self.geocoder.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid geocoder provider '{}'. Must be one of: {:?}",
                self.geocoder.provider, valid_geocoders
            )));
        }
        if self.geocoder.timeout_secs == 0 {
            return Err(Error::config(
                "geocoder.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The places API credential, if configured anywhere
    pub fn places_api_key(&self) -> Option<String> {
        self.places
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("NEARBY_PLACES_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_PLACES_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}
