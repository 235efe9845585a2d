//! Search coordination for nearby search
//!
//! The [`SearchCoordinator`] turns query edits and location changes into
//! debounced, cancellable place searches and publishes a single
//! [`SearchState`](nearby_core::SearchState). Only the newest search may
//! update that state.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod coordinator;
mod handle;
mod settings;

pub use coordinator::SearchCoordinator;
pub use handle::CoordinatorHandle;
pub use settings::CoordinatorSettings;
