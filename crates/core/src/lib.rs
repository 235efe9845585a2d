//! Core types for the nearby place search pipeline
//!
//! This crate provides the foundational pieces shared by the location,
//! places and coordinator crates:
//!
//! - **Domain types**: places, positions, location and search state
//! - **Observable**: the subject/observer holder used to publish state
//! - **Configuration**: layered configuration loading
//! - **Error handling**: unified error type and the user-facing taxonomy

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod location_state;
pub mod observable;
pub mod place;
pub mod position;
pub mod search_state;

// Re-export main types for convenience
pub use config::{Config, GeocoderConfig, LocationConfig, PlacesConfig, SearchConfig};
pub use error::{Error, Result, ResultExt};
pub use location_state::{
    Authorization, LocationFailure, LocationFeed, LocationState, LocationUpdate,
};
pub use observable::{Observable, Subscription};
pub use place::{OpenNow, Place, PlaceId};
pub use position::Position;
pub use search_state::{ErrorKind, SearchPhase, SearchState};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
    pub use crate::location_state::LocationState;
    pub use crate::place::Place;
    pub use crate::position::Position;
    pub use crate::search_state::SearchState;
}
