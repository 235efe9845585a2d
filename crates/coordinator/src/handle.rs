//! Caller-facing handle to a running coordinator

use nearby_core::{LocationState, Observable, SearchState, Subscription};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
pub(crate) enum Command {
    SetQuery(String),
    Retry,
    Shutdown,
}

/// Handle for driving and observing a [`SearchCoordinator`]
///
/// Dropping the handle stops the coordinator and cancels any in-flight
/// search.
///
/// [`SearchCoordinator`]: crate::SearchCoordinator
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: Observable<SearchState>,
    location: Observable<LocationState>,
    task: Option<JoinHandle<()>>,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        state: Observable<SearchState>,
        location: Observable<LocationState>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            commands,
            state,
            location,
            task: Some(task),
        }
    }

    /// Replace the query text
    pub fn set_query(&self, text: impl Into<String>) {
        self.send(Command::SetQuery(text.into()));
    }

    /// Re-run the current query without waiting for the debounce
    pub fn retry(&self) {
        self.send(Command::Retry);
    }

    /// Snapshot of the search state
    pub fn state(&self) -> SearchState {
        self.state.get()
    }

    /// The published search state
    pub fn search_state(&self) -> Observable<SearchState> {
        self.state.clone()
    }

    /// Snapshot of the location state as last seen by the coordinator
    pub fn location(&self) -> LocationState {
        self.location.get()
    }

    /// The location state as last seen by the coordinator
    pub fn location_state(&self) -> Observable<LocationState> {
        self.location.clone()
    }

    /// Register a callback for every search state change
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn subscribe(&self, callback: impl Fn(&SearchState) + Send + Sync + 'static) -> Subscription {
        self.state.subscribe(callback)
    }

    /// Async view of the search state
    pub fn watch(&self) -> watch::Receiver<SearchState> {
        self.state.watch()
    }

    /// Stop the coordinator and wait for it to finish
    pub async fn shutdown(mut self) {
        self.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Coordinator already stopped");
        }
    }
}

impl Drop for CoordinatorHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.commands.send(Command::Shutdown);
        }
    }
}
