//! Location permission and resolution state

use crate::observable::{Observable, Subscription};
use crate::position::Position;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::sync::mpsc;

/// Platform authorization status for location access
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Authorization {
    #[default]
    NotDetermined,
    Denied,
    Restricted,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

impl Authorization {
    /// Whether position updates may be requested
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }

    /// Whether the user (or a policy) has refused access
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied | Self::Restricted)
    }
}

/// Failure reported by the platform location service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LocationFailure {
    #[error("location signal unavailable")]
    Unavailable,
    #[error("timed out waiting for a position fix")]
    Timeout,
    #[error("location service error: {0}")]
    Other(String),
}

/// The process-wide view of where the user is
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LocationState {
    #[default]
    Unknown,
    PermissionDenied,
    Resolving,
    Resolved {
        position: Position,
        display_name: String,
    },
}

impl LocationState {
    /// The current position, if one is exposed
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Resolved { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Resolved { display_name, .. } => Some(display_name),
            _ => None,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

/// One change published by a position provider
#[derive(Debug, Clone, PartialEq)]
pub enum LocationUpdate {
    State(LocationState),
    Failure(Option<LocationFailure>),
}

/// Receiving side of a position provider, as consumed by the coordinator
///
/// Every transition is queued, so a short-lived state (a revocation that is
/// granted again straight away) is never coalesced away.
#[derive(Debug)]
pub struct LocationFeed {
    pub initial: LocationState,
    pub initial_failure: Option<LocationFailure>,
    pub updates: mpsc::UnboundedReceiver<LocationUpdate>,
    _subscriptions: Vec<Subscription>,
}

impl LocationFeed {
    /// Follow a provider's published state and failure
    pub fn follow(
        state: &Observable<LocationState>,
        failure: &Observable<Option<LocationFailure>>,
    ) -> Self {
        let (tx, updates) = mpsc::unbounded_channel();

        let state_tx = tx.clone();
        let (initial, state_sub) = state.subscribe_from_current(move |s| {
            let _ = state_tx.send(LocationUpdate::State(s.clone()));
        });
        let (initial_failure, failure_sub) = failure.subscribe_from_current(move |f| {
            let _ = tx.send(LocationUpdate::Failure(f.clone()));
        });

        Self {
            initial,
            initial_failure,
            updates,
            _subscriptions: vec![state_sub, failure_sub],
        }
    }

    /// A feed that never changes, for callers without a provider
    pub fn fixed(state: LocationState) -> Self {
        let (_tx, updates) = mpsc::unbounded_channel();
        Self {
            initial: state,
            initial_failure: None,
            updates,
            _subscriptions: Vec::new(),
        }
    }
}
