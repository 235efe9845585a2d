//! Position provider
//!
//! Wraps a [`LocationPlatform`] and publishes a single [`LocationState`].
//! Each call to [`PositionProvider::start_locating`] is an *activation*: the
//! first position that arrives during it is accepted, updates are stopped
//! straight away, and a reverse lookup fills in the display name. Later
//! updates in the same activation are ignored.
//!
//! Activations, platform events and revocations are all handled on one
//! event task, so they are applied in the order they were issued.

use crate::geocoder::ReverseGeocoder;
use crate::platform::{LocationEvent, LocationPlatform};
use nearby_core::{
    Authorization, LocationFailure, LocationFeed, LocationState, Observable, Position,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Per-activation bookkeeping
#[derive(Debug, Default)]
struct Session {
    /// Incremented on every activation and on revocation
    activation: u64,
    /// Whether the current activation still accepts a position
    accepting: bool,
}

/// Requests from the provider handle to its event task
enum Request {
    StartLocating(oneshot::Sender<()>),
}

struct Shared {
    platform: Arc<dyn LocationPlatform>,
    geocoder: Arc<dyn ReverseGeocoder>,
    state: Observable<LocationState>,
    failure: Observable<Option<LocationFailure>>,
    session: Mutex<Session>,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Acquires positions and publishes the location state
pub struct PositionProvider {
    shared: Arc<Shared>,
    requests: mpsc::UnboundedSender<Request>,
    event_task: JoinHandle<()>,
}

impl PositionProvider {
    /// Create a provider and start draining platform events
    ///
    /// If location access is already denied, the state starts as
    /// `PermissionDenied`.
    pub async fn new(
        platform: Arc<dyn LocationPlatform>,
        events: mpsc::Receiver<LocationEvent>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        let initial = if platform.authorization().await.is_denied() {
            LocationState::PermissionDenied
        } else {
            LocationState::Unknown
        };

        let shared = Arc::new(Shared {
            platform,
            geocoder,
            state: Observable::new(initial),
            failure: Observable::new(None),
            session: Mutex::new(Session::default()),
        });

        let (requests, request_rx) = mpsc::unbounded_channel();
        let event_task = tokio::spawn(run_event_loop(Arc::clone(&shared), events, request_rx));

        Self {
            shared,
            requests,
            event_task,
        }
    }

    /// Show the permission prompt if the user has not decided yet
    pub async fn request_permission(&self) {
        let authorization = self.shared.platform.authorization().await;
        if authorization == Authorization::NotDetermined {
            info!("Requesting location permission");
            self.shared.platform.request_authorization().await;
        } else {
            debug!("Location permission already decided ({authorization}); not prompting");
        }
    }

    /// Current platform authorization
    pub async fn current_authorization(&self) -> Authorization {
        self.shared.platform.authorization().await
    }

    /// Begin a new activation
    ///
    /// Does nothing unless location access is authorized. Returns once the
    /// activation has been applied.
    pub async fn start_locating(&self) {
        let (done, applied) = oneshot::channel();
        if self.requests.send(Request::StartLocating(done)).is_err() {
            warn!("Location event task has stopped; cannot start locating");
            return;
        }
        let _ = applied.await;
    }

    /// Snapshot of the location state
    pub fn state(&self) -> LocationState {
        self.shared.state.get()
    }

    /// The published location state
    pub fn location_state(&self) -> Observable<LocationState> {
        self.shared.state.clone()
    }

    /// The most recent location-service failure of the current activation
    pub fn failures(&self) -> Observable<Option<LocationFailure>> {
        self.shared.failure.clone()
    }

    /// Every state and failure change from now on, for the coordinator
    pub fn feed(&self) -> LocationFeed {
        LocationFeed::follow(&self.shared.state, &self.shared.failure)
    }
}

impl Drop for PositionProvider {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

async fn start_activation(shared: &Arc<Shared>) {
    let authorization = shared.platform.authorization().await;
    if !authorization.is_authorized() {
        debug!("start_locating ignored: authorization is {authorization}");
        return;
    }

    let activation = {
        let mut session = shared.session();
        session.activation += 1;
        session.accepting = true;
        session.activation
    };
    debug!(activation, "Starting location updates");

    shared.failure.set(None);
    shared.state.set(LocationState::Resolving);

    if let Err(e) = shared.platform.start_updates().await {
        warn!(activation, "Failed to start location updates: {e}");
        shared
            .failure
            .set(Some(LocationFailure::Other(e.to_string())));
    }
}

async fn run_event_loop(
    shared: Arc<Shared>,
    mut events: mpsc::Receiver<LocationEvent>,
    mut requests: mpsc::UnboundedReceiver<Request>,
) {
    loop {
        tokio::select! {
            Some(request) = requests.recv() => match request {
                Request::StartLocating(done) => {
                    start_activation(&shared).await;
                    let _ = done.send(());
                }
            },
            event = events.recv() => match event {
                Some(LocationEvent::PositionUpdated(position)) => {
                    on_position(&shared, position).await
                }
                Some(LocationEvent::Failed(failure)) => on_failure(&shared, failure),
                Some(LocationEvent::AuthorizationChanged(authorization)) => {
                    on_authorization_changed(&shared, authorization).await
                }
                None => break,
            },
        }
    }
    debug!("Location event channel closed");
}

async fn on_position(shared: &Arc<Shared>, position: Position) {
    let activation = {
        let mut session = shared.session();
        if !session.accepting {
            trace!("Ignoring position update outside an accepting activation");
            return;
        }
        session.accepting = false;
        session.activation
    };

    info!(activation, "Position acquired: {position}");
    shared.failure.set(None);
    shared.state.set(LocationState::Resolved {
        position,
        display_name: position.coordinate_label(),
    });

    // Single fix per activation
    shared.platform.stop_updates().await;

    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        let name = match shared.geocoder.reverse(&position).await {
            Ok(placemark) => placemark.display_name(),
            Err(e) => {
                debug!(activation, "Reverse lookup failed, keeping coordinates: {e}");
                None
            }
        };
        let Some(name) = name else {
            return;
        };

        // Hold the session lock so a concurrent activation or revocation
        // cannot interleave with the check-and-publish
        let session = shared.session();
        if session.activation != activation {
            debug!(activation, "Discarding stale reverse lookup");
            return;
        }
        if shared.state.get().position() != Some(position) {
            debug!(activation, "Location state moved on; discarding reverse lookup");
            return;
        }
        shared.state.set(LocationState::Resolved {
            position,
            display_name: name,
        });
        drop(session);
    });
}

fn on_failure(shared: &Arc<Shared>, failure: LocationFailure) {
    let accepting = shared.session().accepting;
    if !accepting {
        trace!("Ignoring location failure outside an accepting activation: {failure}");
        return;
    }
    // Stay in Resolving; the caller decides whether to retry
    warn!("Location service failure: {failure}");
    shared.failure.set(Some(failure));
}

async fn on_authorization_changed(shared: &Arc<Shared>, authorization: Authorization) {
    info!("Location authorization changed to {authorization}");

    if authorization.is_denied() {
        {
            let mut session = shared.session();
            session.activation += 1;
            session.accepting = false;
        }
        shared.state.set(LocationState::PermissionDenied);
        shared.platform.stop_updates().await;
        return;
    }

    if authorization.is_authorized() {
        let needs_fix = matches!(
            shared.state.get(),
            LocationState::Unknown | LocationState::PermissionDenied
        );
        if needs_fix {
            start_activation(shared).await;
        }
    }
}
