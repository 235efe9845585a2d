//! Places backend seam

use async_trait::async_trait;
use nearby_core::error::Result;
use nearby_core::{Place, Position};

/// One text search against a places service
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearchRequest {
    /// Client-assigned id, used to correlate log lines
    pub request_id: u64,
    /// Free-text query, already trimmed and non-empty
    pub query: String,
    /// Where to search around
    pub location: Position,
    /// Search radius in meters
    pub radius_m: u32,
}

/// Trait for places search backends
///
/// Implementations perform exactly one request per call and decode the
/// response into places in service order.
#[async_trait]
pub trait PlacesBackend: Send + Sync {
    /// Run a text search
    ///
    /// # Returns
    /// The decoded places, possibly empty. Transport problems and refused
    /// requests are `Error::Network`; undecodable responses are
    /// `Error::Decode`.
    async fn text_search(&self, request: &TextSearchRequest) -> Result<Vec<Place>>;

    /// Short name for logs
    fn name(&self) -> &str;
}
