//! HTTP client for the remote health-information systems.
//!
//! [`ExtractClient`] wraps a configured `reqwest` client plus the bearer
//! token obtained at connect time. Fetch operations live in [`iaso`]
//! (org-unit registry listing) and [`dhis2`] (analytics value extraction and
//! metadata lookups). All calls fail fast on a non-success status; there is
//! no retry or backoff.

pub mod auth;
pub mod dhis2;
pub mod iaso;

use std::time::Duration;

use healthpull_shared::{Credentials, HealthPullError, Result};

pub use auth::{AuthToken, authenticate};
pub use dhis2::AnalyticsResult;

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("healthpull/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client used for all outbound calls.
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| HealthPullError::Fetch(format!("failed to build HTTP client: {e}")))
}

/// An authenticated client bound to one remote system for one pipeline run.
#[derive(Debug, Clone)]
pub struct ExtractClient {
    http: reqwest::Client,
    base_url: String,
    token: AuthToken,
}

impl ExtractClient {
    /// Build the HTTP client and perform the token exchange.
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let http = build_http_client()?;
        let token = authenticate(&http, credentials).await?;

        Ok(Self {
            http,
            base_url: credentials.base_url().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Base URL of the connected system, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(self.token.secret())
    }
}

/// Map a non-success response to a fetch error, or pass it through.
pub(crate) async fn check_status(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HealthPullError::Fetch(format!("{context}: HTTP {status}")))
    }
}
