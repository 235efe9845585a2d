//! Position acquisition for nearby search
//!
//! This crate provides:
//! - [`PositionProvider`]: permission handling, single-shot position
//!   acquisition and reverse lookup of a display name
//! - [`LocationPlatform`]: the seam to the platform location service, with a
//!   fixed-coordinate implementation and a mock for tests
//! - [`ReverseGeocoder`]: reverse geocoding providers (Nominatim, no-op,
//!   static)

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod geocoder;
mod mock;
mod nominatim;
mod platform;
mod provider;

pub use geocoder::{create_geocoder, NoopGeocoder, Placemark, ReverseGeocoder, StaticGeocoder};
pub use mock::MockLocationPlatform;
pub use nominatim::NominatimGeocoder;
pub use platform::{FixedLocationPlatform, LocationEvent, LocationPlatform};
pub use provider::PositionProvider;
