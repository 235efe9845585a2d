//! Decoding of text-search responses
//!
//! Items are decoded one by one: a malformed item is skipped without failing
//! the batch. Only a response that is not a results object at all, or whose
//! items are all malformed, is a decode failure.

use nearby_core::error::{Error, Result};
use nearby_core::{OpenNow, Place, Position};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Upstream statuses that mean the request succeeded
const SUCCESS_STATUSES: [&str; 2] = ["OK", "ZERO_RESULTS"];

#[derive(Debug, Deserialize)]
struct RawPlace {
    name: String,
    formatted_address: Option<String>,
    vicinity: Option<String>,
    rating: Option<f64>,
    opening_hours: Option<RawOpeningHours>,
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawOpeningHours {
    open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: RawLatLng,
}

#[derive(Debug, Deserialize)]
struct RawLatLng {
    lat: f64,
    lng: f64,
}

impl RawPlace {
    fn into_place(self, origin: Option<&Position>) -> Option<Place> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }

        let address = self
            .formatted_address
            .or(self.vicinity)
            .unwrap_or_default();

        let distance_km = match (origin, self.geometry) {
            (Some(origin), Some(geometry)) => Some(
                nearby_core::position::haversine_km(
                    origin.latitude,
                    origin.longitude,
                    geometry.location.lat,
                    geometry.location.lng,
                ),
            ),
            _ => None,
        };

        Some(
            Place::new(name, address.trim())
                .with_rating(self.rating)
                .with_open_now(OpenNow::from(
                    self.opening_hours.and_then(|h| h.open_now),
                ))
                .with_distance_km(distance_km),
        )
    }
}

/// Decode a text-search response body
///
/// # Arguments
/// * `body` - Raw response body
/// * `origin` - Position the search was made from; used to fill distances
///
/// # Returns
/// The decoded places in response order
pub fn decode_text_search(body: &str, origin: Option<&Position>) -> Result<Vec<Place>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::decode(format!("response is not valid JSON: {e}")))?;

    let Value::Object(mut object) = value else {
        return Err(Error::decode("response is not a JSON object"));
    };

    let status = object
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(status) = status.as_deref() {
        if !SUCCESS_STATUSES.contains(&status) {
            let message = object
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("no error message");
            return Err(Error::network(format!(
                "places service returned status {status}: {message}"
            )));
        }
    }

    let items = match object.remove("results") {
        Some(Value::Array(items)) => items,
        None if status.as_deref() == Some("ZERO_RESULTS") => return Ok(Vec::new()),
        Some(_) => return Err(Error::decode("`results` is not an array")),
        None => return Err(Error::decode("response has no `results` array")),
    };

    let total = items.len();
    let places: Vec<Place> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            match serde_json::from_value::<RawPlace>(item) {
                Ok(raw) => {
                    let place = raw.into_place(origin);
                    if place.is_none() {
                        debug!("Skipping result {index}: blank name");
                    }
                    place
                }
                Err(e) => {
                    debug!("Skipping malformed result {index}: {e}");
                    None
                }
            }
        })
        .collect();

    if total > 0 && places.is_empty() {
        return Err(Error::decode(format!(
            "all {total} results were malformed"
        )));
    }
    if places.len() < total {
        warn!(
            "Decoded {}/{} results; skipped {} malformed",
            places.len(),
            total,
            total - places.len()
        );
    }

    Ok(places)
}
