//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_PLACES_BASE_URL: &str =
    "https://maps.googleapis.com/maps/api/place/textsearch/json";
pub(crate) const DEFAULT_GEOCODER_PROVIDER: &str = "nominatim";
pub(crate) const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub(crate) const DEFAULT_USER_AGENT: &str = concat!("nearby/", env!("CARGO_PKG_VERSION"));

pub(crate) fn default_debounce_ms() -> u64 {
    400
}

pub(crate) fn default_min_query_length() -> usize {
    2
}

pub(crate) fn default_places_base_url() -> String {
    DEFAULT_PLACES_BASE_URL.to_string()
}

pub(crate) fn default_radius_m() -> u32 {
    5000
}

pub(crate) fn default_places_timeout_secs() -> u64 {
    10
}

pub(crate) fn default_geocoder_provider() -> String {
    DEFAULT_GEOCODER_PROVIDER.to_string()
}

pub(crate) fn default_geocoder_base_url() -> String {
    DEFAULT_GEOCODER_BASE_URL.to_string()
}

pub(crate) fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

pub(crate) fn default_geocoder_timeout_secs() -> u64 {
    5
}
