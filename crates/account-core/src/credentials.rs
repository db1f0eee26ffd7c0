//! Session credential issuer abstraction
//!
//! Issues the access/refresh pair returned by successful sign-ins and
//! validates previously issued tokens. The durable implementation lives
//! in `account-store`; the orchestrator only sees this trait.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A freshly issued credential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiration as unix timestamp in milliseconds
    pub expires_at: u64,
}

/// A new access token minted from a refresh grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedAccess {
    pub access_token: String,
    /// Access token expiration as unix timestamp in milliseconds
    pub expires_at: u64,
}

/// Issues and validates session credentials.
pub trait CredentialIssuer: Send + Sync {
    /// Issue a fresh access/refresh pair for the account.
    fn issue<'a>(
        &'a self,
        account_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Credentials>> + Send + 'a>>;

    /// Validate a refresh token and mint a new access token.
    ///
    /// The refresh token itself is NOT rotated. Fails with
    /// `InvalidToken` when the grant is unknown or expired.
    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RefreshedAccess>> + Send + 'a>>;

    /// Resolve a live access token to its account id.
    ///
    /// Used by the transport layer to establish the caller identity
    /// before `iam`. Fails with `InvalidToken` when unknown or expired.
    fn validate_access_token<'a>(
        &'a self,
        access_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}
