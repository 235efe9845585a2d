//! Behavioural tests for the search coordinator
//!
//! All tests run on a paused clock so debounce timing is deterministic.

use nearby_core::{
    ErrorKind, LocationFailure, LocationFeed, LocationState, Observable, Place, Position,
    SearchPhase, SearchState,
};
use nearby_coordinator::{CoordinatorHandle, CoordinatorSettings, SearchCoordinator};
use nearby_places::{MockPlacesBackend, PlaceSearchClient};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

const WAIT: Duration = Duration::from_secs(30);

struct Harness {
    backend: Arc<MockPlacesBackend>,
    location: Observable<LocationState>,
    failure: Observable<Option<LocationFailure>>,
    coordinator: CoordinatorHandle,
}

fn ahmedabad() -> Position {
    // Fixed timestamp so separately built positions compare equal
    Position::at(23.03, 72.58, Default::default())
}

fn resolved() -> LocationState {
    LocationState::Resolved {
        position: ahmedabad(),
        display_name: "Ahmedabad, Gujarat".to_string(),
    }
}

fn harness(initial: LocationState) -> Harness {
    let backend = Arc::new(MockPlacesBackend::new());
    let client = Arc::new(PlaceSearchClient::new(backend.clone(), 5000));
    let location = Observable::new(initial);
    let failure = Observable::new(None);
    let feed = LocationFeed::follow(&location, &failure);
    let coordinator = SearchCoordinator::spawn(client, feed, CoordinatorSettings::default());
    Harness {
        backend,
        location,
        failure,
        coordinator,
    }
}

async fn wait_for(
    coordinator: &CoordinatorHandle,
    pred: impl FnMut(&SearchState) -> bool,
) -> SearchState {
    let mut rx = coordinator.watch();
    let state = tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for search state")
        .expect("coordinator stopped")
        .clone();
    state
}

fn names(state: &SearchState) -> Vec<String> {
    state.results.iter().map(|p| p.name().to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_short_query_never_searches() {
    let h = harness(resolved());

    h.coordinator.set_query("a");
    h.coordinator.set_query(" b ");
    sleep(Duration::from_secs(2)).await;

    assert_eq!(h.backend.request_count(), 0);
    let state = h.coordinator.state();
    assert_eq!(state.phase, SearchPhase::Idle);
    assert!(!state.is_loading);
    assert_eq!(state.query, " b ");
}

#[tokio::test(start_paused = true)]
async fn test_rapid_typing_issues_one_request_with_final_text() {
    let h = harness(resolved());
    h.backend
        .respond("atm", vec![Place::new("HDFC Bank ATM", "CG Road")]);

    h.coordinator.set_query("a");
    sleep(Duration::from_millis(100)).await;
    h.coordinator.set_query("at");
    sleep(Duration::from_millis(100)).await;
    assert_eq!(h.coordinator.state().phase, SearchPhase::Debouncing);
    h.coordinator.set_query("atm");

    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;
    assert_eq!(names(&state), vec!["HDFC Bank ATM"]);
    assert_eq!(h.backend.queries(), vec!["atm".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_atm_scenario_completes_in_order() {
    let h = harness(resolved());
    h.backend.respond_after(
        "atm",
        vec![
            Place::new("HDFC Bank ATM", "CG Road").with_rating(Some(4.2)),
            Place::new("SBI ATM", "Ashram Road"),
        ],
        Duration::from_millis(200),
    );

    let loading = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&loading);
    let _subscription = h.coordinator.subscribe(move |s| {
        seen.lock().expect("lock").push(s.is_loading);
    });

    h.coordinator.set_query("atm");
    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;

    assert_eq!(state.results.len(), 2);
    assert_eq!(names(&state), vec!["HDFC Bank ATM", "SBI ATM"]);
    assert_eq!(state.results[0].rating(), Some(4.2));
    assert_eq!(state.results[1].rating(), None);
    assert!(!state.is_loading);
    assert_eq!(state.last_error, None);

    let loading = loading.lock().expect("lock").clone();
    assert!(loading.contains(&true), "never reported loading: {loading:?}");
    assert_eq!(loading.last(), Some(&false));

    let requests = h.backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].location, ahmedabad());
    assert_eq!(requests[0].radius_m, 5000);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_response_never_lands() {
    let h = harness(resolved());
    h.backend.respond_after(
        "first",
        vec![Place::new("Stale", "Old Road")],
        Duration::from_millis(1000),
    );
    h.backend.respond_after(
        "second",
        vec![Place::new("Fresh", "New Road")],
        Duration::from_millis(100),
    );

    h.coordinator.set_query("first");
    wait_for(&h.coordinator, |s| s.phase == SearchPhase::Searching).await;

    h.coordinator.set_query("second");
    sleep(Duration::from_millis(10)).await;
    let state = h.coordinator.state();
    assert_eq!(state.phase, SearchPhase::Debouncing);
    assert!(state.is_loading, "superseding keeps the loading indicator");

    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;
    assert_eq!(names(&state), vec!["Fresh"]);

    // Outlive the slow first response
    sleep(Duration::from_secs(3)).await;
    assert_eq!(names(&h.coordinator.state()), vec!["Fresh"]);
    assert_eq!(
        h.backend.queries(),
        vec!["first".to_string(), "second".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_revoking_permission_while_searching() {
    let h = harness(resolved());
    h.backend.respond_after(
        "atm",
        vec![Place::new("HDFC Bank ATM", "CG Road")],
        Duration::from_millis(1000),
    );

    h.coordinator.set_query("atm");
    wait_for(&h.coordinator, |s| s.phase == SearchPhase::Searching).await;

    h.location.set(LocationState::PermissionDenied);

    let state = wait_for(&h.coordinator, |s| {
        s.last_error == Some(ErrorKind::PermissionDenied)
    })
    .await;
    assert_eq!(state.phase, SearchPhase::Idle);
    assert!(!state.is_loading);

    sleep(Duration::from_secs(3)).await;
    let state = h.coordinator.state();
    assert!(state.results.is_empty());
    assert_eq!(state.phase, SearchPhase::Idle);
    assert_eq!(h.coordinator.location(), LocationState::PermissionDenied);
}

#[tokio::test(start_paused = true)]
async fn test_denied_from_start_rejects_without_network() {
    let h = harness(LocationState::PermissionDenied);

    h.coordinator.set_query("atm");
    let state = wait_for(&h.coordinator, |s| s.last_error.is_some()).await;

    assert_eq!(state.last_error, Some(ErrorKind::PermissionDenied));
    assert_eq!(state.phase, SearchPhase::Idle);
    assert_eq!(h.backend.request_count(), 0);
    assert_eq!(h.coordinator.location(), LocationState::PermissionDenied);

    h.coordinator.retry();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.backend.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_clears_results() {
    let h = harness(resolved());
    h.backend
        .respond("atm", vec![Place::new("HDFC Bank ATM", "CG Road")])
        .fail("atms", ErrorKind::NetworkFailure);

    h.coordinator.set_query("atm");
    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;
    assert_eq!(state.results.len(), 1);

    h.coordinator.set_query("atms");
    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Failed).await;
    assert!(state.results.is_empty());
    assert!(!state.is_loading);
    assert_eq!(state.last_error, Some(ErrorKind::NetworkFailure));
    assert_eq!(
        state.user_message(),
        Some(ErrorKind::NetworkFailure.user_message())
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_reissues_without_debounce() {
    let h = harness(resolved());
    h.backend
        .fail("atm", ErrorKind::DecodeFailure)
        .respond("atm", vec![Place::new("SBI ATM", "Ashram Road")]);

    h.coordinator.set_query("atm");
    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Failed).await;
    assert_eq!(state.last_error, Some(ErrorKind::DecodeFailure));

    let started = Instant::now();
    h.coordinator.retry();
    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;

    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(names(&state), vec!["SBI ATM"]);
    assert_eq!(state.last_error, None);
    assert_eq!(h.backend.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_query_waits_for_position() {
    let h = harness(LocationState::Resolving);
    h.backend
        .respond("atm", vec![Place::new("HDFC Bank ATM", "CG Road")]);

    h.coordinator.set_query("atm");
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.backend.request_count(), 0);
    let state = h.coordinator.state();
    assert_eq!(state.phase, SearchPhase::Debouncing);
    assert!(state.is_loading);

    h.location.set(resolved());
    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;
    assert_eq!(names(&state), vec!["HDFC Bank ATM"]);
    assert_eq!(h.backend.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_location_failure_while_waiting_reports_position_unavailable() {
    let h = harness(LocationState::Resolving);
    h.backend
        .respond("atm", vec![Place::new("HDFC Bank ATM", "CG Road")]);

    h.coordinator.set_query("atm");
    sleep(Duration::from_secs(1)).await;

    h.failure.set(Some(LocationFailure::Timeout));
    let state = wait_for(&h.coordinator, |s| s.last_error.is_some()).await;
    assert_eq!(state.last_error, Some(ErrorKind::PositionUnavailable));
    assert!(!state.is_loading);

    // The query stays armed until a position shows up
    h.location.set(resolved());
    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;
    assert_eq!(state.last_error, None);
    assert_eq!(state.results.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_identical_query_is_ignored() {
    let h = harness(resolved());
    h.backend
        .respond("atm", vec![Place::new("HDFC Bank ATM", "CG Road")]);

    h.coordinator.set_query("atm");
    wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;

    h.coordinator.set_query("atm");
    sleep(Duration::from_secs(2)).await;
    assert_eq!(h.backend.request_count(), 1);
    assert_eq!(h.coordinator.state().phase, SearchPhase::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_shortening_query_goes_idle_and_clears() {
    let h = harness(resolved());
    h.backend.respond_after(
        "atm",
        vec![Place::new("HDFC Bank ATM", "CG Road")],
        Duration::from_millis(500),
    );
    h.backend.respond("bank", vec![Place::new("Axis Bank", "Law Garden")]);

    h.coordinator.set_query("bank");
    wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;

    // In flight, then cut below the minimum
    h.coordinator.set_query("atm");
    wait_for(&h.coordinator, |s| s.phase == SearchPhase::Searching).await;
    h.coordinator.set_query("a");

    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Idle).await;
    assert!(state.results.is_empty());
    assert!(!state.is_loading);

    sleep(Duration::from_secs(2)).await;
    assert!(h.coordinator.state().results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_empty_result_is_a_completed_search() {
    let h = harness(resolved());

    h.coordinator.set_query("unicorn repair");
    let state = wait_for(&h.coordinator, |s| s.phase == SearchPhase::Completed).await;

    assert!(state.is_empty_result());
    assert_eq!(state.last_error, None);
    assert_eq!(state.user_message(), Some("No places found nearby."));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_processing() {
    let h = harness(resolved());
    let state = h.coordinator.search_state();
    let backend = Arc::clone(&h.backend);

    h.coordinator.shutdown().await;
    drop(h.location);
    sleep(Duration::from_secs(1)).await;

    assert_eq!(state.get(), SearchState::default());
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_revoke_then_regrant_discards_pending_response() {
    let h = harness(resolved());
    h.backend.respond_after(
        "atm",
        vec![Place::new("Pre-revoke", "CG Road")],
        Duration::from_millis(1000),
    );

    let errors = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&errors);
    let _subscription = h.coordinator.subscribe(move |s| {
        seen.lock().expect("lock").push(s.last_error);
    });

    h.coordinator.set_query("atm");
    wait_for(&h.coordinator, |s| s.phase == SearchPhase::Searching).await;

    // Denied and granted again before the coordinator gets to run
    h.location.set(LocationState::PermissionDenied);
    h.location.set(LocationState::Resolving);

    sleep(Duration::from_secs(3)).await;
    let state = h.coordinator.state();
    assert_eq!(state.phase, SearchPhase::Idle);
    assert!(state.results.is_empty());
    assert!(!state.is_loading);
    assert!(errors
        .lock()
        .expect("lock")
        .contains(&Some(ErrorKind::PermissionDenied)));

    // Access is back, so the denial is no longer reported
    assert_eq!(state.last_error, None);
    h.location.set(resolved());
    sleep(Duration::from_millis(10)).await;
    assert_eq!(h.coordinator.state().last_error, None);
    assert_eq!(h.coordinator.location(), resolved());
}
