//! Scripted places backend for tests

use crate::backend::{PlacesBackend, TextSearchRequest};
use async_trait::async_trait;
use nearby_core::error::{Error, Result};
use nearby_core::{ErrorKind, Place};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// What the mock answers for a query
#[derive(Debug, Clone)]
pub enum MockReply {
    Places(Vec<Place>),
    Fail(ErrorKind),
}

#[derive(Debug, Clone)]
struct Scripted {
    reply: MockReply,
    delay: Duration,
}

#[derive(Debug, Default)]
struct MockState {
    scripts: HashMap<String, VecDeque<Scripted>>,
    requests: Vec<TextSearchRequest>,
}

/// Backend answering from scripted replies
///
/// Replies are keyed by query text and consumed in order; the last reply
/// for a query repeats. Unscripted queries answer with no places. Delays
/// use tokio time, so paused-clock tests stay deterministic.
#[derive(Debug, Default)]
pub struct MockPlacesBackend {
    state: Mutex<MockState>,
}

impl MockPlacesBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer `query` with `places`
    pub fn respond(&self, query: &str, places: Vec<Place>) -> &Self {
        self.script(query, MockReply::Places(places), Duration::ZERO)
    }

    /// Answer `query` with `places` after `delay`
    pub fn respond_after(&self, query: &str, places: Vec<Place>, delay: Duration) -> &Self {
        self.script(query, MockReply::Places(places), delay)
    }

    /// Fail `query` with `kind`
    pub fn fail(&self, query: &str, kind: ErrorKind) -> &Self {
        self.script(query, MockReply::Fail(kind), Duration::ZERO)
    }

    /// Queue a reply for `query`
    pub fn script(&self, query: &str, reply: MockReply, delay: Duration) -> &Self {
        self.state()
            .scripts
            .entry(query.to_string())
            .or_default()
            .push_back(Scripted { reply, delay });
        self
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<TextSearchRequest> {
        self.state().requests.clone()
    }

    /// Query text of every request received, in order
    pub fn queries(&self) -> Vec<String> {
        self.state()
            .requests
            .iter()
            .map(|r| r.query.clone())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    fn next_reply(&self, request: &TextSearchRequest) -> Scripted {
        let mut state = self.state();
        state.requests.push(request.clone());

        let Some(queue) = state.scripts.get_mut(&request.query) else {
            return Scripted {
                reply: MockReply::Places(Vec::new()),
                delay: Duration::ZERO,
            };
        };
        if queue.len() > 1 {
            if let Some(next) = queue.pop_front() {
                return next;
            }
        }
        queue.front().cloned().unwrap_or(Scripted {
            reply: MockReply::Places(Vec::new()),
            delay: Duration::ZERO,
        })
    }
}

#[async_trait]
impl PlacesBackend for MockPlacesBackend {
    async fn text_search(&self, request: &TextSearchRequest) -> Result<Vec<Place>> {
        let scripted = self.next_reply(request);
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        match scripted.reply {
            MockReply::Places(places) => Ok(places),
            MockReply::Fail(ErrorKind::DecodeFailure) => {
                Err(Error::decode("scripted decode failure"))
            }
            MockReply::Fail(ErrorKind::PermissionDenied) => Err(Error::PermissionDenied),
            MockReply::Fail(ErrorKind::PositionUnavailable) => {
                Err(Error::location("scripted position failure"))
            }
            MockReply::Fail(ErrorKind::NetworkFailure) => {
                Err(Error::network("scripted network failure"))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
