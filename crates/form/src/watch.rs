//! Metadata for the watch the page is configuring.

use serde::{Deserialize, Serialize};

/// Pebble hardware platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Aplite,
    Basalt,
    Chalk,
    Diorite,
    Emery,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aplite => "aplite",
            Self::Basalt => "basalt",
            Self::Chalk => "chalk",
            Self::Diorite => "diorite",
            Self::Emery => "emery",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active watch as reported by the phone app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchInfo {
    pub platform: Platform,
    /// Hardware model string, e.g. `pebble_time_round_silver_20`.
    #[serde(default)]
    pub model: Option<String>,
}

impl WatchInfo {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            model: None,
        }
    }
}
