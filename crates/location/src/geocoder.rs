//! Reverse geocoding seam

use async_trait::async_trait;
use nearby_core::config::GeocoderConfig;
use nearby_core::error::{Error, Result};
use nearby_core::Position;
use std::sync::Arc;
use tracing::info;

/// Human-readable description of a coordinate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    pub locality: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl Placemark {
    /// "City, Region", falling back to whichever parts are present
    ///
    /// Returns `None` when the lookup produced nothing usable.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.locality, &self.region]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if !parts.is_empty() {
            return Some(parts.join(", "));
        }

        self.country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

/// Trait for reverse geocoding providers
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Describe the place at `position`
    async fn reverse(&self, position: &Position) -> Result<Placemark>;
}

/// Geocoder that never resolves; callers keep the coordinate label
pub struct NoopGeocoder;

#[async_trait]
impl ReverseGeocoder for NoopGeocoder {
    async fn reverse(&self, _position: &Position) -> Result<Placemark> {
        Err(Error::geocoding("reverse geocoding disabled"))
    }
}

/// Geocoder returning a fixed answer, for tests and offline runs
pub struct StaticGeocoder {
    answer: Option<Placemark>,
    delay: std::time::Duration,
}

impl StaticGeocoder {
    /// Always answer with `placemark`
    pub fn new(placemark: Placemark) -> Self {
        Self {
            answer: Some(placemark),
            delay: std::time::Duration::ZERO,
        }
    }

    /// Always fail
    pub fn failing() -> Self {
        Self {
            answer: None,
            delay: std::time::Duration::ZERO,
        }
    }

    /// Wait `delay` before answering
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ReverseGeocoder for StaticGeocoder {
    async fn reverse(&self, _position: &Position) -> Result<Placemark> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer
            .clone()
            .ok_or_else(|| Error::geocoding("no placemark for position"))
    }
}

/// Create a reverse geocoder based on configuration
pub fn create_geocoder(config: &GeocoderConfig) -> Result<Arc<dyn ReverseGeocoder>> {
    match config.provider.as_str() {
        "nominatim" => {
            info!("Creating Nominatim reverse geocoder");
            let geocoder = crate::nominatim::NominatimGeocoder::new(
                config.base_url.clone(),
                config.user_agent.clone(),
                config.timeout_secs,
            )?;
            Ok(Arc::new(geocoder))
        }
        "none" => {
            info!("Reverse geocoding disabled");
            Ok(Arc::new(NoopGeocoder))
        }
        other => Err(Error::config(format!(
            "Unknown geocoder provider: '{other}'. Valid providers: nominatim, none"
        ))),
    }
}
