//! Token exchange against the remote system's token endpoint.

use serde::Deserialize;
use tracing::{debug, info};

use healthpull_shared::{Credentials, HealthPullError, Result};

/// Opaque bearer token, created once per run and never persisted.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    /// The raw bearer string, for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

// Keep the token out of debug output and logs.
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access: Option<String>,
}

/// Exchange credentials for a bearer token.
///
/// Username/password pairs are POSTed to `{base}/api/token/`; a ready-made
/// API token passes through without a network call. Failure is fatal to the
/// run — there is no retry.
pub async fn authenticate(http: &reqwest::Client, credentials: &Credentials) -> Result<AuthToken> {
    let (base_url, username, password) = match credentials {
        Credentials::Token { api_token, .. } => {
            debug!("using configured API token, skipping token exchange");
            return Ok(AuthToken(api_token.clone()));
        }
        Credentials::UserPass {
            base_url,
            username,
            password,
        } => (base_url, username, password),
    };

    let token_url = format!("{}/api/token/", base_url.trim_end_matches('/'));

    let response = http
        .post(&token_url)
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .map_err(|e| HealthPullError::Auth(format!("{token_url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HealthPullError::Auth(format!(
            "{token_url}: HTTP {status}"
        )));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| HealthPullError::Auth(format!("{token_url}: malformed response: {e}")))?;

    let access = body.access.filter(|t| !t.is_empty()).ok_or_else(|| {
        HealthPullError::Auth(format!("{token_url}: response lacks 'access' field"))
    })?;

    info!("token exchange succeeded");
    Ok(AuthToken(access))
}
