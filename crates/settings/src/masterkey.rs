//! Master Key (pmkey.xyz) account lookup.
//!
//! One Master Key account holds a user's API keys for several watchapp
//! services. The settings page fetches the account's weather ring with the
//! account email and PIN, then fills the provider key field from it.

use {
    async_trait::async_trait,
    serde::Deserialize,
    tracing::{debug, warn},
};

use crate::provider::WeatherProvider;

/// Search endpoint of the Master Key service.
pub const SEARCH_ENDPOINT: &str = "https://pmkey.xyz/search/";

/// Weather API keys held in a Master Key account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherKeys {
    #[serde(default)]
    pub owm: Option<String>,
    #[serde(default)]
    pub wu: Option<String>,
    #[serde(default)]
    pub forecast: Option<String>,
}

impl WeatherKeys {
    /// The key stored for `provider`, when the account has a non-empty one.
    #[must_use]
    pub fn for_provider(&self, provider: WeatherProvider) -> Option<&str> {
        let key = match provider {
            WeatherProvider::OpenWeatherMap => self.owm.as_deref(),
            WeatherProvider::WeatherUnderground => self.wu.as_deref(),
            WeatherProvider::Forecast => self.forecast.as_deref(),
        };
        key.filter(|key| !key.is_empty())
    }
}

/// Per-service key rings of one account. Only the weather ring is read
/// here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyRing {
    #[serde(default)]
    pub weather: Option<WeatherKeys>,
}

/// Body of a search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub keys: Option<KeyRing>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResponse {
    /// The weather ring, when the account carries one.
    #[must_use]
    pub fn weather_keys(&self) -> Option<&WeatherKeys> {
        self.keys.as_ref().and_then(|ring| ring.weather.as_ref())
    }
}

/// Transport-level failure of a search call. The display form is exactly
/// what the status line shows.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {body}")]
pub struct LookupError {
    /// HTTP status, or 0 when the request never reached the service.
    pub status: u16,
    pub body: String,
}

/// Client seam for the search call; tests substitute a stub.
#[async_trait]
pub trait MasterKeyClient: Send + Sync {
    /// Fetch the key rings for an account. `Ok` carries any parsed body,
    /// including `success: false` rejections.
    async fn search(&self, email: &str, pin: &str) -> Result<SearchResponse, LookupError>;
}

/// HTTP client for the live service.
#[derive(Debug, Clone)]
pub struct HttpMasterKeyClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpMasterKeyClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(SEARCH_ENDPOINT)
    }

    /// Point the client at a different endpoint (tests).
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Build the search URL. Email and PIN are substituted verbatim, with
    /// no URL-encoding: the service expects the raw values.
    fn search_url(&self, email: &str, pin: &str) -> String {
        format!("{}?email={email}&pin={pin}", self.endpoint)
    }
}

impl Default for HttpMasterKeyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MasterKeyClient for HttpMasterKeyClient {
    async fn search(&self, email: &str, pin: &str) -> Result<SearchResponse, LookupError> {
        let url = self.search_url(email, pin);
        debug!("searching master key account");

        let response = self.http.get(&url).send().await.map_err(|error| {
            warn!(%error, "master key search never reached the service");
            LookupError {
                status: 0,
                body: error.to_string(),
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            warn!(%error, "master key search body could not be read");
            LookupError {
                status: status.as_u16(),
                body: error.to_string(),
            }
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "master key search rejected");
            return Err(LookupError {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|error| LookupError {
            status: status.as_u16(),
            body: format!("invalid response body: {error}"),
        })
    }
}
