//! Points of interest returned by a place search

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

/// Valid range for upstream ratings
pub const RATING_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.0;

/// Client-generated identity of a place
///
/// Upstream identifiers are not trusted to be present or unique, so each
/// decoded item gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceId(Uuid);

impl PlaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a place is open right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OpenNow {
    Open,
    Closed,
    #[default]
    Unknown,
}

impl From<Option<bool>> for OpenNow {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Open,
            Some(false) => Self::Closed,
            None => Self::Unknown,
        }
    }
}

/// A point of interest
///
/// Optional attributes that the upstream payload omitted stay `None`; a place
/// without a rating is never reported as rated zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    id: PlaceId,
    name: String,
    address: String,
    rating: Option<f64>,
    open_now: OpenNow,
    distance_km: Option<f64>,
}

impl Place {
    /// Create a place with only the required attributes set
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: PlaceId::new(),
            name: name.into(),
            address: address.into(),
            rating: None,
            open_now: OpenNow::Unknown,
            distance_km: None,
        }
    }

    /// Set the rating; values outside 1.0–5.0 (or NaN) leave it unset
    pub fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating.filter(|r| RATING_RANGE.contains(r));
        self
    }

    pub fn with_open_now(mut self, open_now: OpenNow) -> Self {
        self.open_now = open_now;
        self
    }

    /// Set the distance; negative or non-finite values leave it unset
    pub fn with_distance_km(mut self, distance_km: Option<f64>) -> Self {
        self.distance_km = distance_km.filter(|d| d.is_finite() && *d >= 0.0);
        self
    }

    pub fn id(&self) -> PlaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    pub fn open_now(&self) -> OpenNow {
        self.open_now
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.distance_km
    }
}
