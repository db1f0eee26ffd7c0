//! External OAuth provider abstraction
//!
//! Decouples the orchestrator from the concrete provider client. The
//! Google adapter in the service binary implements this by exchanging the
//! code and resolving the profile in one call; tests substitute canned
//! identities.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::SignInProvider;

/// The provider-side identity and token material obtained from a code
/// exchange: the subject id and email used for account linking plus the
/// tokens cached on the provider link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub provider_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Provider token expiration as unix timestamp in milliseconds
    pub expires_at: u64,
}

/// Abstraction over an external OAuth provider's token and profile
/// endpoints.
pub trait IdentityProvider: Send + Sync {
    /// Which provider kind this client exchanges codes for.
    fn provider(&self) -> SignInProvider;

    /// Exchange an authorization code for the provider identity.
    ///
    /// `redirect_uri` must match the URI the code was issued against;
    /// `None` means the adapter's configured redirect URI (the
    /// re-consent flow, where no origin travels with the request).
    /// Fails with `Provider` on an invalid or expired code.
    fn exchange_code<'a>(
        &'a self,
        code: &'a str,
        redirect_uri: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<ProviderIdentity>> + Send + 'a>>;
}
