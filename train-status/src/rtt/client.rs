//! Timetable API HTTP client.
//!
//! Queries the location search endpoint for services between two locations
//! on a given date. Authentication is HTTP Basic, set once as a default
//! header on the underlying `reqwest::Client`.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Datelike, NaiveDate};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use super::error::RttError;
use super::types::{SearchResponse, ServiceRecord};
use super::{Route, TimetableSource};

/// Default base URL for the timetable API.
const DEFAULT_BASE_URL: &str = "https://api.rtt.io/api/v1/json";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the timetable client.
#[derive(Debug, Clone)]
pub struct RttConfig {
    /// API username
    pub username: String,
    /// API password
    pub password: String,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl RttConfig {
    /// Create a new config with the given credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Timetable API client.
#[derive(Debug, Clone)]
pub struct RttClient {
    http: reqwest::Client,
    base_url: String,
}

impl RttClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RttConfig) -> Result<Self, RttError> {
        let mut headers = HeaderMap::new();

        let credentials = STANDARD.encode(format!("{}:{}", config.username, config.password));
        let mut auth = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| RttError::InvalidCredentials(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        // The timeout bounds each attempt independently of retry/backoff timing.
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the search URL for a route and date.
    pub fn search_url(&self, route: &Route, date: NaiveDate) -> String {
        format!(
            "{}/search/{}/to/{}/{:04}/{:02}/{:02}",
            self.base_url,
            route.origin.as_str(),
            route.destination.as_str(),
            date.year(),
            date.month(),
            date.day(),
        )
    }

    /// Fetch services running from the route origin to its destination on `date`.
    pub async fn search_services(
        &self,
        route: &Route,
        date: NaiveDate,
    ) -> Result<Vec<ServiceRecord>, RttError> {
        let url = self.search_url(route, date);
        debug!(%url, "requesting timetable search");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RttError::Http {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let body = response.text().await?;

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| RttError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

        let services = parsed.into_services();
        debug!(%route, %date, count = services.len(), "timetable search returned");
        Ok(services)
    }
}

impl TimetableSource for RttClient {
    fn search(
        &self,
        route: &Route,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<ServiceRecord>, RttError>> + Send {
        self.search_services(route, date)
    }
}
