//! Message keys and element ids shared with the watch app and the page
//! markup.

// Message keys (watch app dictionary).
pub const WEATHER_ENABLED: &str = "WEATHER_ENABLED";
pub const WEATHER_USE_GPS: &str = "WEATHER_USE_GPS";
pub const WEATHER_LOCATION_NAME: &str = "WEATHER_LOCATION_NAME";
pub const WEATHER_PROVIDER: &str = "WEATHER_PROVIDER";
pub const WEATHER_KEY: &str = "WEATHER_KEY";
pub const SHOW_STEPS: &str = "SHOW_STEPS";
pub const ENABLE_HEALTH: &str = "ENABLE_HEALTH";

// Element ids (page-local controls with no message key).
pub const MASTER_KEY_EMAIL: &str = "masterKeyEmail";
pub const MASTER_KEY_PIN: &str = "masterKeyPin";
pub const MASTER_KEY_BUTTON: &str = "masterKeyButton";
pub const MASTER_KEY_TEXT: &str = "masterKeyText";

/// Group tag carried by every weather-section item.
pub const WEATHER_GROUP: &str = "weather";
