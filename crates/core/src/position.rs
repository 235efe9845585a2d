//! Geographic positions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean earth radius used for great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A single position fix
///
/// Snapshots are `Copy`; the provider that produced a position keeps its own
/// copy and consumers never mutate it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// Create a position stamped with the current time
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::at(latitude, longitude, Utc::now())
    }

    /// Create a position with an explicit timestamp
    pub fn at(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Whether both coordinates are finite and inside their valid ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Query-parameter form used by places APIs: `"<lat>,<lng>"`
    pub fn to_query_param(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Display name used until (or instead of) a reverse lookup result
    pub fn coordinate_label(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Great-circle distance in kilometers (haversine)
    pub fn distance_km(&self, other: &Position) -> f64 {
        haversine_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Haversine distance between two coordinate pairs in kilometers
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}
