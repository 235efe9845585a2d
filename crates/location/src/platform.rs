//! Platform location service seam

use async_trait::async_trait;
use nearby_core::error::Result;
use nearby_core::{Authorization, LocationFailure, Position};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Capacity of the platform event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Asynchronous notifications from the platform location service
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A new position fix
    PositionUpdated(Position),
    /// The service failed to produce a fix
    Failed(LocationFailure),
    /// The user (or a policy) changed location authorization
    AuthorizationChanged(Authorization),
}

/// Trait for platform location services
///
/// Commands go through this trait; results come back as [`LocationEvent`]s on
/// the channel handed out when the platform was created.
#[async_trait]
pub trait LocationPlatform: Send + Sync {
    /// Current authorization status
    async fn authorization(&self) -> Authorization;

    /// Show the permission prompt
    ///
    /// The outcome is delivered later as [`LocationEvent::AuthorizationChanged`].
    async fn request_authorization(&self);

    /// Begin delivering position updates
    async fn start_updates(&self) -> Result<()>;

    /// Stop delivering position updates
    async fn stop_updates(&self);
}

/// Platform that always reports the same coordinates
///
/// Used where there is no device location service, e.g. the CLI with
/// `--lat/--lng` or a `[location]` config section.
pub struct FixedLocationPlatform {
    latitude: f64,
    longitude: f64,
    events: mpsc::Sender<LocationEvent>,
}

impl FixedLocationPlatform {
    /// Create the platform and the event receiver to hand to a provider
    pub fn new(latitude: f64, longitude: f64) -> (Self, mpsc::Receiver<LocationEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                latitude,
                longitude,
                events,
            },
            rx,
        )
    }
}

#[async_trait]
impl LocationPlatform for FixedLocationPlatform {
    async fn authorization(&self) -> Authorization {
        Authorization::AuthorizedWhenInUse
    }

    async fn request_authorization(&self) {}

    async fn start_updates(&self) -> Result<()> {
        let position = Position::new(self.latitude, self.longitude);
        debug!("Fixed platform reporting {position}");
        if self
            .events
            .send(LocationEvent::PositionUpdated(position))
            .await
            .is_err()
        {
            warn!("Fixed platform has no listener; dropping position update");
        }
        Ok(())
    }

    async fn stop_updates(&self) {}
}
