//! Authorization-code exchange and profile lookup
//!
//! Handles the two Google endpoint interactions of a sign-in:
//! 1. Authorization code exchange against the token endpoint
//! 2. Profile lookup against the userinfo endpoint
//!
//! Google's web-server flow is a confidential-client flow: the exchange
//! authenticates with the client secret, and the redirect URI must match
//! the one used to obtain the code.

use serde::{Deserialize, Serialize};

use crate::constants::{TOKEN_ENDPOINT, USERINFO_ENDPOINT};
use crate::error::{Error, Result};

/// Response from the token endpoint.
///
/// `expires_in` is a delta in seconds from the response time. The caller
/// converts this to an absolute unix millisecond timestamp when storing
/// the provider link. `refresh_token` is only present when the
/// authorization request asked for offline access.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: u64,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Google profile fields from the userinfo endpoint.
///
/// `id` is the provider-assigned subject identifier — stable across
/// sign-ins and the uniting key for repeated Google logins.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub verified_email: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Google OAuth client holding the confidential-client configuration.
///
/// Endpoints default to Google's production URLs; `with_endpoints`
/// redirects them at a test server.
pub struct GoogleClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_endpoint: String,
    userinfo_endpoint: String,
}

impl GoogleClient {
    /// Create a client for Google's production endpoints.
    pub fn new(http: reqwest::Client, client_id: String, client_secret: String) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            token_endpoint: TOKEN_ENDPOINT.into(),
            userinfo_endpoint: USERINFO_ENDPOINT.into(),
        }
    }

    /// Override the token and userinfo endpoints (test servers, regional
    /// mirrors).
    pub fn with_endpoints(mut self, token_endpoint: String, userinfo_endpoint: String) -> Self {
        self.token_endpoint = token_endpoint;
        self.userinfo_endpoint = userinfo_endpoint;
        self
    }

    /// Exchange an authorization code for tokens.
    ///
    /// `redirect_uri` must be the exact URI the code was issued against;
    /// Google rejects the exchange otherwise.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(Error::TokenExchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))
    }

    /// Resolve an access token to the Google profile.
    ///
    /// Called right after a successful exchange to learn the subject id
    /// and email the account-linking logic keys on.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile> {
        let response = self
            .http
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Http(format!("userinfo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(Error::Userinfo(format!(
                "userinfo endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<GoogleProfile>()
            .await
            .map_err(|e| Error::Userinfo(format!("invalid userinfo response: {e}")))
    }
}
