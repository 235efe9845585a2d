//! Cancellable place search client
//!
//! Every call to [`PlaceSearchClient::search`] issues exactly one backend
//! request on its own task and returns a [`SearchHandle`]. Cancelling the
//! handle guarantees that its outcome is never delivered, even if the
//! request already completed.

use crate::backend::{PlacesBackend, TextSearchRequest};
use nearby_core::error::{Error, Result};
use nearby_core::{ErrorKind, Place, Position};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

/// Result of a completed search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The service answered; may be empty
    Found(Vec<Place>),
    /// The request failed; no places
    Failed(ErrorKind),
}

impl SearchOutcome {
    /// The places carried by the outcome (empty on failure)
    pub fn places(&self) -> &[Place] {
        match self {
            Self::Found(places) => places,
            Self::Failed(_) => &[],
        }
    }

    /// The error carried by the outcome, if any
    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            Self::Found(_) => None,
            Self::Failed(kind) => Some(*kind),
        }
    }
}

/// Cancels an in-flight search without owning its handle
#[derive(Debug, Clone)]
pub struct SearchCanceller {
    request_id: u64,
    token: CancellationToken,
}

impl SearchCanceller {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!(request_id = self.request_id, "Cancelling search");
            self.token.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Handle to one in-flight search
///
/// Dropping the handle without awaiting [`SearchHandle::outcome`] discards
/// the result but does not abort the request.
#[derive(Debug)]
pub struct SearchHandle {
    request_id: u64,
    token: CancellationToken,
    outcome: oneshot::Receiver<SearchOutcome>,
}

impl SearchHandle {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Cancel the search; its outcome will not be delivered
    pub fn cancel(&self) {
        self.canceller().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A detached canceller for this search
    pub fn canceller(&self) -> SearchCanceller {
        SearchCanceller {
            request_id: self.request_id,
            token: self.token.clone(),
        }
    }

    /// Wait for the search to finish
    ///
    /// # Returns
    /// `None` if the search was cancelled, before or after completion
    pub async fn outcome(self) -> Option<SearchOutcome> {
        let outcome = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            result = self.outcome => result.ok(),
        };

        // Cancellation may land between the send and this check
        if self.token.is_cancelled() {
            return None;
        }
        outcome
    }
}

/// Issues text searches around a position
pub struct PlaceSearchClient {
    backend: Arc<dyn PlacesBackend>,
    radius_m: u32,
    next_request_id: AtomicU64,
}

impl PlaceSearchClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `backend` - Service to query
    /// * `radius_m` - Search radius in meters for every request
    pub fn new(backend: Arc<dyn PlacesBackend>, radius_m: u32) -> Self {
        info!(
            "Place search client using {} backend, radius {radius_m}m",
            backend.name()
        );
        Self {
            backend,
            radius_m,
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn radius_m(&self) -> u32 {
        self.radius_m
    }

    /// Start a search for `query` around `near`
    ///
    /// Exactly one backend request is issued. The query is trimmed before
    /// it is sent.
    ///
    /// # Errors
    /// `Error::InvalidInput` if the query is blank; no request is issued.
    pub fn search(&self, query: &str, near: Position) -> Result<SearchHandle> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_input("search query is empty"));
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let request = TextSearchRequest {
            request_id,
            query: query.to_string(),
            location: near,
            radius_m: self.radius_m,
        };

        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let backend = Arc::clone(&self.backend);
        let task_token = token.clone();
        let span = tracing::debug_span!("place_search", request_id);

        tokio::spawn(
            async move {
                debug!("Searching {:?} near {}", request.query, request.location);

                let result = tokio::select! {
                    biased;
                    _ = task_token.cancelled() => {
                        debug!("Search cancelled before completion");
                        return;
                    }
                    result = backend.text_search(&request) => result,
                };

                let outcome = match result {
                    Ok(places) => {
                        debug!("Search returned {} places", places.len());
                        SearchOutcome::Found(places)
                    }
                    Err(e) => {
                        warn!("Search failed: {e}");
                        SearchOutcome::Failed(e.kind())
                    }
                };

                if task_token.is_cancelled() {
                    debug!("Search cancelled; dropping outcome");
                    return;
                }
                let _ = tx.send(outcome);
            }
            .instrument(span),
        );

        Ok(SearchHandle {
            request_id,
            token,
            outcome: rx,
        })
    }
}
