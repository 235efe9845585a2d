//! Tests for configuration module

use super::*;
use crate::error::{Error, Result};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn create_temp_config_file(content: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .map_err(|e| Error::config(format!("Failed to create temp file: {e}")))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::config(format!("Failed to write temp file: {e}")))?;
    file.flush()
        .map_err(|e| Error::config(format!("Failed to flush temp file: {e}")))?;
    Ok(file)
}

fn with_env_var<F, T>(key: &str, value: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    std::env::set_var(key, value);
    let result = f();
    std::env::remove_var(key);
    result
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.search.debounce_ms, 400);
    assert_eq!(config.search.min_query_length, 2);
    assert_eq!(config.places.radius_m, 5000);
    assert_eq!(config.places.api_key, None);
    assert_eq!(config.geocoder.provider, "nominatim");
    assert!(config.location.fixed_coordinates().is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_str_valid() {
    let toml = r#"
        [search]
        debounce_ms = 250
        min_query_length = 3

        [places]
        radius_m = 1500
        api_key = "test-key"

        [location]
        latitude = 23.03
        longitude = 72.58

        [geocoder]
        provider = "none"
    "#;

    let config = Config::from_toml_str(toml).expect("Failed to parse valid TOML");
    assert_eq!(config.search.debounce_ms, 250);
    assert_eq!(config.search.min_query_length, 3);
    assert_eq!(config.places.radius_m, 1500);
    assert_eq!(config.places.api_key.as_deref(), Some("test-key"));
    assert_eq!(config.location.fixed_coordinates(), Some((23.03, 72.58)));
    assert_eq!(config.geocoder.provider, "none");
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_str_minimal() {
    let config = Config::from_toml_str("").expect("Failed to parse empty TOML");
    assert_eq!(config.search.debounce_ms, 400);
    assert_eq!(config.places.timeout_secs, 10);
    assert_eq!(
        config.places.base_url,
        "https://maps.googleapis.com/maps/api/place/textsearch/json"
    );
}

#[test]
fn test_from_toml_str_invalid_syntax() {
    let toml = r#"
        [places
        radius_m = 10
    "#;

    let result = Config::from_toml_str(toml);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to parse TOML"));
}

#[test]
fn test_validate_rejects_zero_min_query_length() {
    let mut config = Config::default();
    config.search.min_query_length = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("min_query_length"));
}

#[test]
fn test_validate_rejects_radius_out_of_range() {
    let mut config = Config::default();
    config.places.radius_m = 0;
    assert!(config.validate().is_err());
    config.places.radius_m = MAX_RADIUS_M + 1;
    assert!(config.validate().is_err());
    config.places.radius_m = MAX_RADIUS_M;
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_long_debounce() {
    let mut config = Config::default();
    config.search.debounce_ms = MAX_DEBOUNCE_MS + 1;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_half_configured_location() {
    let mut config = Config::default();
    config.location.latitude = Some(10.0);
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("must be set together"));
}

#[test]
fn test_validate_rejects_out_of_range_location() {
    let mut config = Config::default();
    config.location.latitude = Some(120.0);
    config.location.longitude = Some(0.0);
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_unknown_geocoder() {
    let mut config = Config::default();
    config.geocoder.provider = "teleport".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Invalid geocoder provider"));
}

#[test]
fn test_from_file_reads_values() {
    let file = create_temp_config_file(
        r#"
        [search]
        debounce_ms = 300

        [geocoder]
        user_agent = "nearby-test/1.0"
    "#,
    )
    .expect("temp file");

    let config = Config::from_file(file.path()).expect("load config");
    assert_eq!(config.search.debounce_ms, 300);
    assert_eq!(config.search.min_query_length, 2);
    assert_eq!(config.geocoder.user_agent, "nearby-test/1.0");
}

#[test]
fn test_from_file_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config::from_file(&dir.path().join("absent.toml")).expect("load config");
    assert_eq!(config.search.min_query_length, 2);
    assert_eq!(config.geocoder.timeout_secs, 5);
}

#[test]
fn test_env_override_nested_value() {
    let file = create_temp_config_file("[places]\nradius_m = 1000\n").expect("temp file");
    let config = with_env_var("NEARBY_PLACES__RADIUS_M", "2500", || {
        Config::from_file(file.path())
    })
    .expect("load config");
    assert_eq!(config.places.radius_m, 2500);
}

#[test]
fn test_debug_redacts_api_key() {
    let mut config = Config::default();
    config.places.api_key = Some("super-secret".to_string());
    let debug = format!("{config:?}");
    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("REDACTED"));
}

#[test]
fn test_save_round_trips_through_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("config.toml");
    let mut config = Config::default();
    config.search.debounce_ms = 350;
    config.location.latitude = Some(23.03);
    config.location.longitude = Some(72.58);
    config.save(&path).expect("save config");

    let loaded = Config::from_file(&path).expect("reload config");
    assert_eq!(loaded.search.debounce_ms, 350);
    assert_eq!(loaded.location.fixed_coordinates(), Some((23.03, 72.58)));
}
