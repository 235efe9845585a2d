//! Tests for CLI helpers

use nearby::{format_place, format_results, format_status, is_settled, resolve_coordinates, Config};
use nearby_core::{ErrorKind, OpenNow, Place, SearchPhase, SearchState};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_flags_override_config_location() {
    let config = Config::from_toml_str(
        r#"
        [location]
        latitude = 10.0
        longitude = 20.0
        "#,
    )
    .expect("parse config");

    let position = resolve_coordinates(&config, Some(23.03), Some(72.58)).expect("resolve");
    assert_eq!((position.latitude, position.longitude), (23.03, 72.58));

    let position = resolve_coordinates(&config, None, None).expect("resolve");
    assert_eq!((position.latitude, position.longitude), (10.0, 20.0));
}

#[test]
fn test_location_from_config_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    writeln!(file, "[location]\nlatitude = -33.86\nlongitude = 151.21").expect("write");

    let config = Config::from_file(file.path()).expect("load config");
    let position = resolve_coordinates(&config, None, None).expect("resolve");
    assert_eq!(position.latitude, -33.86);
}

#[test]
fn test_missing_or_partial_coordinates_are_errors() {
    let config = Config::default();
    assert!(resolve_coordinates(&config, None, None).is_err());
    assert!(resolve_coordinates(&config, Some(1.0), None).is_err());
    assert!(resolve_coordinates(&config, Some(91.0), Some(0.0)).is_err());
}

#[test]
fn test_format_place_shows_known_details_only() {
    let full = Place::new("HDFC Bank ATM", "CG Road")
        .with_rating(Some(4.2))
        .with_open_now(OpenNow::Open)
        .with_distance_km(Some(1.94));
    assert_eq!(
        format_place(1, &full),
        "1. HDFC Bank ATM [4.2]\n   CG Road | open now | 1.9 km"
    );

    let bare = Place::new("SBI ATM", "");
    assert_eq!(format_place(2, &bare), "2. SBI ATM");
}

#[test]
fn test_settled_states() {
    let mut state = SearchState {
        query: "atm".to_string(),
        phase: SearchPhase::Searching,
        is_loading: true,
        ..Default::default()
    };
    assert!(!is_settled(&state));

    state.phase = SearchPhase::Completed;
    state.is_loading = false;
    assert!(is_settled(&state));

    state.phase = SearchPhase::Idle;
    assert!(!is_settled(&state));
    state.last_error = Some(ErrorKind::PermissionDenied);
    assert!(is_settled(&state));
}

#[test]
fn test_status_uses_generic_messages() {
    let state = SearchState {
        query: "atm".to_string(),
        phase: SearchPhase::Failed,
        last_error: Some(ErrorKind::NetworkFailure),
        ..Default::default()
    };
    assert_eq!(
        format_status(&state),
        ErrorKind::NetworkFailure.user_message()
    );

    let empty = SearchState {
        query: "unicorn".to_string(),
        phase: SearchPhase::Completed,
        ..Default::default()
    };
    assert_eq!(format_status(&empty), "No places found nearby.");
}

#[test]
fn test_results_listing() {
    let state = SearchState {
        query: "atm".to_string(),
        phase: SearchPhase::Completed,
        results: vec![
            Place::new("HDFC Bank ATM", "CG Road"),
            Place::new("SBI ATM", "Ashram Road"),
        ],
        ..Default::default()
    };
    let listing = format_results(&state);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(
        lines,
        vec![
            "2 places found.",
            "1. HDFC Bank ATM",
            "   CG Road",
            "2. SBI ATM",
            "   Ashram Road",
        ]
    );
}
