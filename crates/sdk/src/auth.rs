// Token Acquisition - Keycloak password grant

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::error::TokenError;

/// Keycloak details for a password-grant token request
#[derive(Clone, PartialEq, Eq)]
pub struct KeycloakCredentials {
    /// i.e. `https://example.com/auth`
    pub url: String,
    pub realm: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
}

impl KeycloakCredentials {
    pub fn new(
        url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            realm: realm.into(),
            client_id: client_id.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// The realm's OpenID Connect token endpoint
    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.url.trim_end_matches('/'),
            self.realm
        )
    }

    fn validate(&self) -> Result<(), TokenError> {
        for (field, value) in [
            ("url", &self.url),
            ("realm", &self.realm),
            ("client_id", &self.client_id),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.is_empty() {
                return Err(TokenError::InvalidArgument(format!(
                    "keycloak {} cannot be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

// Keep the password out of logs
impl std::fmt::Debug for KeycloakCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakCredentials")
            .field("url", &self.url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Get an access token with the default (4s) timeout
pub async fn get_access_token(credentials: &KeycloakCredentials) -> Result<String, TokenError> {
    get_access_token_with_timeout(credentials, DEFAULT_REQUEST_TIMEOUT).await
}

/// Get an access token from Keycloak.
///
/// One form-encoded POST to the realm token endpoint. Tokens are not
/// cached or refreshed.
///
/// # Errors
/// * `TokenError::Transport` - Keycloak could not be reached
/// * `TokenError::Rejected` - Keycloak answered with anything but 200
/// * `TokenError::MissingToken` - the 200 response has no `access_token`
pub async fn get_access_token_with_timeout(
    credentials: &KeycloakCredentials,
    timeout: Duration,
) -> Result<String, TokenError> {
    credentials.validate()?;

    let url = credentials.token_url();
    debug!(url = %url, username = %credentials.username, "Requesting access token");

    let form = [
        ("client_id", credentials.client_id.as_str()),
        ("grant_type", "password"),
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
    ];

    let response = reqwest::Client::new()
        .post(&url)
        .form(&form)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            error!(url = %url, error = %e, "Failed to get response from Keycloak");
            TokenError::Transport(e)
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "Failed to get token");
        return Err(TokenError::Rejected { status, body });
    }

    let token: TokenResponse = response.json().await.map_err(TokenError::Transport)?;
    token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(TokenError::MissingToken)
}
