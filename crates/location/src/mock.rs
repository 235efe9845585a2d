//! Mock location platform for testing

use crate::platform::{LocationEvent, LocationPlatform, EVENT_CHANNEL_CAPACITY};
use async_trait::async_trait;
use nearby_core::error::{Error, Result};
use nearby_core::{Authorization, LocationFailure, Position};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Mock platform whose events are driven by the test
///
/// Commands issued by the provider are counted so tests can assert on them.
pub struct MockLocationPlatform {
    authorization: Mutex<Authorization>,
    prompt_response: Mutex<Option<Authorization>>,
    fail_start: AtomicBool,
    updating: AtomicBool,
    prompts: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
    events: mpsc::Sender<LocationEvent>,
}

impl MockLocationPlatform {
    /// Create the mock and the event receiver to hand to a provider
    pub fn new(authorization: Authorization) -> (Self, mpsc::Receiver<LocationEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                authorization: Mutex::new(authorization),
                prompt_response: Mutex::new(None),
                fail_start: AtomicBool::new(false),
                updating: AtomicBool::new(false),
                prompts: AtomicUsize::new(0),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                events,
            },
            rx,
        )
    }

    /// Answer the next permission prompt with `response`
    pub fn answer_prompt_with(&self, response: Authorization) {
        *lock(&self.prompt_response) = Some(response);
    }

    /// Make `start_updates` fail
    pub fn fail_start_updates(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Change authorization and notify the provider, as a settings change would
    pub async fn set_authorization(&self, authorization: Authorization) {
        *lock(&self.authorization) = authorization;
        self.emit(LocationEvent::AuthorizationChanged(authorization))
            .await;
    }

    /// Deliver a position fix
    pub async fn emit_position(&self, position: Position) {
        self.emit(LocationEvent::PositionUpdated(position)).await;
    }

    /// Deliver a service failure
    pub async fn emit_failure(&self, failure: LocationFailure) {
        self.emit(LocationEvent::Failed(failure)).await;
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    async fn emit(&self, event: LocationEvent) {
        let _ = self.events.send(event).await;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LocationPlatform for MockLocationPlatform {
    async fn authorization(&self) -> Authorization {
        *lock(&self.authorization)
    }

    async fn request_authorization(&self) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let response = lock(&self.prompt_response).take();
        if let Some(response) = response {
            self.set_authorization(response).await;
        }
    }

    async fn start_updates(&self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Error::location("mock location service unavailable"));
        }
        self.updating.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_updates(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.updating.store(false, Ordering::SeqCst);
    }
}
