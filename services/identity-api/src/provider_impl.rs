//! Google identity provider — code exchange and profile resolution.
//!
//! Implements the `IdentityProvider` trait by running the two Google
//! round-trips (token exchange, then userinfo) and folding the results
//! into the single `ProviderIdentity` the orchestrator consumes. Both
//! network calls happen here, before the orchestrator touches storage.

use std::future::Future;
use std::pin::Pin;

use account_core::{Error, IdentityProvider, ProviderIdentity, Result, SignInProvider};
use google_auth::GoogleClient;
use tracing::debug;

/// `IdentityProvider` backed by the Google OAuth client.
///
/// Holds the configured default redirect URI for exchanges where no
/// origin travels with the request (the re-consent flow).
pub struct GoogleIdentityProvider {
    client: GoogleClient,
    redirect_uri: String,
}

impl GoogleIdentityProvider {
    pub fn new(client: GoogleClient, redirect_uri: String) -> Self {
        Self {
            client,
            redirect_uri,
        }
    }
}

impl IdentityProvider for GoogleIdentityProvider {
    fn provider(&self) -> SignInProvider {
        SignInProvider::Google
    }

    fn exchange_code<'a>(
        &'a self,
        code: &'a str,
        redirect_uri: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<ProviderIdentity>> + Send + 'a>> {
        Box::pin(async move {
            let redirect = redirect_uri.unwrap_or(&self.redirect_uri);
            let token = self
                .client
                .exchange_code(code, redirect)
                .await
                .map_err(|e| Error::Provider(e.to_string()))?;
            let profile = self
                .client
                .fetch_profile(&token.access_token)
                .await
                .map_err(|e| Error::Provider(e.to_string()))?;
            debug!(provider_id = profile.id, "google identity resolved");

            let now_millis = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;

            Ok(ProviderIdentity {
                provider_id: profile.id,
                email: profile.email,
                access_token: token.access_token,
                // Google omits the refresh token unless offline access
                // was granted; the link then holds an empty refresh slot.
                refresh_token: token.refresh_token.unwrap_or_default(),
                expires_at: now_millis + token.expires_in * 1000,
            })
        })
    }
}
