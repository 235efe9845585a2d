//! The search coordinator actor
//!
//! A single task owns the search state. Commands, the debounce deadline,
//! location changes and search completions are handled one at a time in a
//! `select!` loop; searches run on their own tasks and report back tagged
//! with the generation that issued them.

use crate::handle::{Command, CoordinatorHandle};
use crate::settings::CoordinatorSettings;
use nearby_core::{
    ErrorKind, LocationFailure, LocationFeed, LocationState, LocationUpdate, Observable, Position,
    SearchPhase, SearchState,
};
use nearby_places::{PlaceSearchClient, SearchCanceller, SearchOutcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Completion report from a search task
#[derive(Debug)]
struct Completion {
    generation: u64,
    outcome: SearchOutcome,
}

/// The search currently allowed to update state
#[derive(Debug)]
struct InFlight {
    generation: u64,
    canceller: SearchCanceller,
}

/// Ties query edits and position availability to place searches
pub struct SearchCoordinator {
    client: Arc<PlaceSearchClient>,
    settings: CoordinatorSettings,
    state: Observable<SearchState>,
    location: Observable<LocationState>,
    location_failure: Option<LocationFailure>,
    deadline: Option<Instant>,
    /// The debounce elapsed but no position was available yet
    armed: bool,
    generation: u64,
    in_flight: Option<InFlight>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl SearchCoordinator {
    /// Start the coordinator on the current runtime
    ///
    /// # Arguments
    /// * `client` - Place search client used for every search
    /// * `feed` - Location state and failures from a position provider
    /// * `settings` - Debounce and minimum query length
    pub fn spawn(
        client: Arc<PlaceSearchClient>,
        feed: LocationFeed,
        settings: CoordinatorSettings,
    ) -> CoordinatorHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let state = Observable::new(SearchState::default());
        let location = Observable::new(feed.initial.clone());
        let initial_failure = feed.initial_failure.clone();

        let coordinator = Self {
            client,
            settings,
            state: state.clone(),
            location: location.clone(),
            location_failure: initial_failure,
            deadline: None,
            armed: false,
            generation: 0,
            in_flight: None,
            completions: completion_tx,
        };

        let task = tokio::spawn(coordinator.run(command_rx, completion_rx, feed));
        CoordinatorHandle::new(command_tx, state, location, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        mut feed: LocationFeed,
    ) {
        info!(
            "Search coordinator started (debounce {}ms, min query length {})",
            self.settings.debounce.as_millis(),
            self.settings.min_query_length
        );

        // The feed's subscriptions stay alive for as long as the loop runs
        let mut updates = Some(&mut feed.updates);

        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::SetQuery(text)) => self.on_query_changed(text),
                    Some(Command::Retry) => self.on_retry(),
                    Some(Command::Shutdown) | None => break,
                },
                // Location before completions: a revocation already queued
                // cancels the search before its result is looked at
                Some(update) = next_update(&mut updates) => match update {
                    LocationUpdate::State(location) => self.on_location_changed(location),
                    LocationUpdate::Failure(failure) => self.on_location_failure(failure),
                },
                Some(completion) = completions.recv() => self.on_completion(completion),
                _ = sleep_until(deadline) => self.on_debounce_elapsed(),
            }
        }

        self.cancel_in_flight();
        info!("Search coordinator stopped");
    }

    fn on_query_changed(&mut self, text: String) {
        if self.state.get().query == text {
            trace!("Query unchanged; ignoring");
            return;
        }

        if !self.is_searchable(&text) {
            debug!("Query {text:?} below minimum length; going idle");
            self.deadline = None;
            self.armed = false;
            self.cancel_in_flight();
            self.state.update(|s| {
                s.query = text;
                s.phase = SearchPhase::Idle;
                s.is_loading = false;
                s.results.clear();
                s.last_error = None;
            });
            return;
        }

        // Superseding keeps the loading indicator on
        let superseding = self.in_flight.is_some() || self.armed;
        self.cancel_in_flight();
        self.armed = false;
        self.deadline = Some(Instant::now() + self.settings.debounce);
        trace!("Debouncing query {text:?}");

        self.state.update(|s| {
            s.query = text;
            s.phase = SearchPhase::Debouncing;
            s.is_loading = s.is_loading || superseding;
        });
    }

    fn on_retry(&mut self) {
        let query = self.state.get().query;
        if !self.is_searchable(&query) {
            debug!("Retry ignored: no searchable query");
            return;
        }
        info!("Retrying search for {query:?}");
        self.deadline = None;
        self.search_or_arm();
    }

    fn on_debounce_elapsed(&mut self) {
        self.deadline = None;
        self.search_or_arm();
    }

    /// Search now if a position is available, otherwise wait for one
    fn search_or_arm(&mut self) {
        match self.location.get() {
            LocationState::Resolved { position, .. } => {
                self.armed = false;
                self.issue_search(position);
            }
            LocationState::PermissionDenied => {
                debug!("Location access denied; not searching");
                self.reject_for_permission();
            }
            LocationState::Unknown | LocationState::Resolving => {
                debug!("Waiting for a position before searching");
                self.armed = true;
                self.cancel_in_flight();
                if self.location_failure.is_some() {
                    self.report_position_unavailable();
                } else {
                    self.state.update(|s| {
                        s.phase = SearchPhase::Debouncing;
                        s.is_loading = true;
                    });
                }
            }
        }
    }

    fn issue_search(&mut self, position: Position) {
        self.cancel_in_flight();
        let query = self.state.get().query;

        let handle = match self.client.search(&query, position) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not start search for {query:?}: {e}");
                self.state.update(|s| {
                    s.phase = SearchPhase::Idle;
                    s.is_loading = false;
                });
                return;
            }
        };

        self.generation += 1;
        let generation = self.generation;
        info!(
            generation,
            request_id = handle.request_id(),
            "Searching {query:?} near {position}"
        );

        self.in_flight = Some(InFlight {
            generation,
            canceller: handle.canceller(),
        });

        let completions = self.completions.clone();
        tokio::spawn(async move {
            // Cancelled searches report nothing
            if let Some(outcome) = handle.outcome().await {
                let _ = completions.send(Completion {
                    generation,
                    outcome,
                });
            }
        });

        self.state.update(|s| {
            s.phase = SearchPhase::Searching;
            s.is_loading = true;
            s.last_error = None;
        });
    }

    fn on_completion(&mut self, completion: Completion) {
        let current = self.in_flight.as_ref().map(|f| f.generation);
        if current != Some(completion.generation) {
            debug!(
                generation = completion.generation,
                "Discarding stale search result (current {current:?})"
            );
            return;
        }
        self.in_flight = None;

        match completion.outcome {
            SearchOutcome::Found(places) => {
                info!(
                    generation = completion.generation,
                    "Search completed with {} places",
                    places.len()
                );
                self.state.update(|s| {
                    s.results = places;
                    s.phase = SearchPhase::Completed;
                    s.is_loading = false;
                    s.last_error = None;
                });
            }
            SearchOutcome::Failed(kind) => {
                warn!(generation = completion.generation, "Search failed: {kind}");
                self.state.update(|s| {
                    s.results.clear();
                    s.phase = SearchPhase::Failed;
                    s.is_loading = false;
                    s.last_error = Some(kind);
                });
            }
        }
    }

    fn on_location_changed(&mut self, location: LocationState) {
        trace!("Location state changed: {location:?}");
        self.location.set(location.clone());

        match location {
            LocationState::PermissionDenied => {
                let phase = self.state.get().phase;
                if phase != SearchPhase::Idle || self.in_flight.is_some() || self.armed {
                    info!("Location access revoked; cancelling search");
                }
                self.reject_for_permission();
            }
            LocationState::Resolved { position, .. } if self.armed => {
                debug!("Position available; running armed search");
                self.armed = false;
                self.issue_search(position);
            }
            _ => self.clear_permission_error(),
        }
    }

    fn on_location_failure(&mut self, failure: Option<LocationFailure>) {
        self.location_failure = failure;
        if self.armed && self.location_failure.is_some() {
            self.report_position_unavailable();
        }
    }

    fn report_position_unavailable(&mut self) {
        if let Some(failure) = &self.location_failure {
            warn!("Position unavailable: {failure}");
        }
        self.state.update(|s| {
            s.results.clear();
            s.phase = SearchPhase::Failed;
            s.is_loading = false;
            s.last_error = Some(ErrorKind::PositionUnavailable);
        });
    }

    fn reject_for_permission(&mut self) {
        self.deadline = None;
        self.armed = false;
        self.cancel_in_flight();
        self.state.update(|s| {
            s.phase = SearchPhase::Idle;
            s.is_loading = false;
            s.results.clear();
            s.last_error = Some(ErrorKind::PermissionDenied);
        });
    }

    /// Access is back; stop reporting the earlier denial
    fn clear_permission_error(&mut self) {
        if self.state.get().last_error == Some(ErrorKind::PermissionDenied) {
            debug!("Location access restored");
            self.state.update(|s| s.last_error = None);
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(
                generation = in_flight.generation,
                request_id = in_flight.canceller.request_id(),
                "Cancelling in-flight search"
            );
            in_flight.canceller.cancel();
        }
    }

    fn is_searchable(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.settings.min_query_length
    }
}

/// Next location update, or pending forever once the feed has closed
async fn next_update(
    slot: &mut Option<&mut mpsc::UnboundedReceiver<LocationUpdate>>,
) -> Option<LocationUpdate> {
    let Some(rx) = slot.as_mut() else {
        return std::future::pending().await;
    };
    match rx.recv().await {
        Some(update) => Some(update),
        None => {
            trace!("Location feed closed");
            *slot = None;
            None
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
