//! UI-facing search state

use crate::place::Place;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Failure taxonomy surfaced to consumers
///
/// Zero matches is not an error: it is a `Completed` search with an empty
/// result list (see [`SearchState::is_empty_result`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    PositionUnavailable,
    NetworkFailure,
    DecodeFailure,
}

impl ErrorKind {
    /// Short generic message suitable for display
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Location access is off. Enable it in settings to search nearby."
            }
            Self::PositionUnavailable => "Couldn't determine your location. Try again shortly.",
            Self::NetworkFailure => "Couldn't reach the places service. Try again.",
            Self::DecodeFailure => "Something went wrong reading the results. Try again.",
        }
    }
}

/// Phase of the search state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    #[default]
    Idle,
    Debouncing,
    Searching,
    Completed,
    Failed,
}

/// Observable state of a search session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchState {
    pub query: String,
    pub is_loading: bool,
    pub results: Vec<Place>,
    pub last_error: Option<ErrorKind>,
    pub phase: SearchPhase,
}

impl SearchState {
    /// A completed search that matched nothing
    pub fn is_empty_result(&self) -> bool {
        self.phase == SearchPhase::Completed && self.results.is_empty()
    }

    /// Status line for display, if any
    pub fn user_message(&self) -> Option<&'static str> {
        if let Some(kind) = self.last_error {
            return Some(kind.user_message());
        }
        if self.is_empty_result() {
            return Some("No places found nearby.");
        }
        None
    }
}
