//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `NEARBY_` and use double underscores
    /// for nested values. For example:
    /// - `NEARBY_PLACES__RADIUS_M=2000`
    /// - `NEARBY_SEARCH__DEBOUNCE_MS=250`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // Search defaults
        let builder =
            set_config_default(builder, "search.debounce_ms", default_debounce_ms() as i64)?;
        let builder = set_config_default(
            builder,
            "search.min_query_length",
            default_min_query_length() as i64,
        )?;

        // Places defaults
        let builder = set_config_default(builder, "places.base_url", default_places_base_url())?;
        let builder = set_config_default(builder, "places.radius_m", default_radius_m() as i64)?;
        let builder = set_config_default(
            builder,
            "places.timeout_secs",
            default_places_timeout_secs() as i64,
        )?;

        // Geocoder defaults
        let builder =
            set_config_default(builder, "geocoder.provider", default_geocoder_provider())?;
        let builder =
            set_config_default(builder, "geocoder.base_url", default_geocoder_base_url())?;
        let builder = set_config_default(builder, "geocoder.user_agent", default_user_agent())?;
        let mut builder = set_config_default(
            builder,
            "geocoder.timeout_secs",
            default_geocoder_timeout_secs() as i64,
        )?;

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Add environment variables with NEARBY_ prefix
        builder = builder.add_source(
            Environment::with_prefix("NEARBY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Credential fallbacks, highest precedence
        if let Ok(key) = std::env::var("NEARBY_PLACES_API_KEY") {
            builder = builder
                .set_override("places.api_key", key)
                .map_err(|e| Error::config(format!("Failed to set NEARBY_PLACES_API_KEY: {e}")))?;
        } else if let Ok(key) = std::env::var("GOOGLE_PLACES_API_KEY") {
            builder = builder
                .set_override("places.api_key", key)
                .map_err(|e| Error::config(format!("Failed to set GOOGLE_PLACES_API_KEY: {e}")))?;
        }

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.nearby/config.toml or custom --config path)
    /// 3. Environment variables (NEARBY_*)
    /// 4. Credential variables (NEARBY_PLACES_API_KEY, then GOOGLE_PLACES_API_KEY)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
