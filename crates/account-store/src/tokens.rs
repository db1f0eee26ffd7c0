//! Durable session credential store
//!
//! Issues opaque access/refresh token pairs and validates them later.
//! Grants map token material to the owning account id plus an absolute
//! expiry; expired grants are pruned lazily whenever a mutation already
//! holds the lock. Refresh grants are NOT rotated on refresh — a refresh
//! mints a new access grant and leaves the refresh grant untouched.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use account_core::{CredentialIssuer, Credentials, Error, RefreshedAccess, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::fsutil::{load_or_init, write_atomic};
use crate::now_millis;

/// Default access token lifetime.
const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime.
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// One issued grant: the owning account and an absolute expiry in unix
/// milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Grant {
    account_id: String,
    expires_at: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenState {
    access: HashMap<String, Grant>,
    refresh: HashMap<String, Grant>,
}

/// Thread-safe credential file store.
pub struct FileTokenStore {
    path: PathBuf,
    access_ttl: Duration,
    refresh_ttl: Duration,
    state: Mutex<TokenState>,
}

impl FileTokenStore {
    /// Load issued grants from the given file path with default TTLs,
    /// creating an empty store file on cold start.
    pub async fn load(path: PathBuf) -> Result<Self> {
        Self::load_with_ttls(path, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL).await
    }

    /// Load with explicit TTLs.
    pub async fn load_with_ttls(
        path: PathBuf,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self> {
        let state: TokenState = load_or_init(&path, "tokens").await?;
        Ok(Self {
            path,
            access_ttl,
            refresh_ttl,
            state: Mutex::new(state),
        })
    }

    /// Issue a fresh access/refresh pair for the account.
    pub async fn issue(&self, account_id: &str) -> Result<Credentials> {
        let now = now_millis();
        let access_token = common::uid::generate_secret();
        let refresh_token = common::uid::generate_secret();
        let expires_at = now + self.access_ttl.as_millis() as u64;

        let mut state = self.state.lock().await;
        prune_expired(&mut state, now);
        state.access.insert(
            access_token.clone(),
            Grant {
                account_id: account_id.to_owned(),
                expires_at,
            },
        );
        state.refresh.insert(
            refresh_token.clone(),
            Grant {
                account_id: account_id.to_owned(),
                expires_at: now + self.refresh_ttl.as_millis() as u64,
            },
        );
        write_atomic(&self.path, &*state, "tokens").await?;
        debug!(account_id, "credential pair issued");

        Ok(Credentials {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Validate a refresh grant and mint a new access token. The refresh
    /// grant is left as-is.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedAccess> {
        let now = now_millis();
        let mut state = self.state.lock().await;

        let account_id = match state.refresh.get(refresh_token) {
            Some(grant) if grant.expires_at > now => grant.account_id.clone(),
            Some(_) => {
                state.refresh.remove(refresh_token);
                write_atomic(&self.path, &*state, "tokens").await?;
                return Err(Error::InvalidToken("refresh grant expired".into()));
            }
            None => return Err(Error::InvalidToken("unknown refresh token".into())),
        };

        let access_token = common::uid::generate_secret();
        let expires_at = now + self.access_ttl.as_millis() as u64;
        prune_expired(&mut state, now);
        state.access.insert(
            access_token.clone(),
            Grant {
                account_id: account_id.clone(),
                expires_at,
            },
        );
        write_atomic(&self.path, &*state, "tokens").await?;
        debug!(account_id, "access token refreshed");

        Ok(RefreshedAccess {
            access_token,
            expires_at,
        })
    }

    /// Resolve a live access token to its account id.
    pub async fn validate_access_token(&self, access_token: &str) -> Result<String> {
        let now = now_millis();
        let state = self.state.lock().await;
        match state.access.get(access_token) {
            Some(grant) if grant.expires_at > now => Ok(grant.account_id.clone()),
            Some(_) => Err(Error::InvalidToken("access token expired".into())),
            None => Err(Error::InvalidToken("unknown access token".into())),
        }
    }
}

/// Drop grants past their expiry. Called from paths that already hold
/// the lock and are about to persist anyway.
fn prune_expired(state: &mut TokenState, now: u64) {
    state.access.retain(|_, grant| grant.expires_at > now);
    state.refresh.retain(|_, grant| grant.expires_at > now);
}

impl CredentialIssuer for FileTokenStore {
    fn issue<'a>(
        &'a self,
        account_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Credentials>> + Send + 'a>> {
        Box::pin(self.issue(account_id))
    }

    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RefreshedAccess>> + Send + 'a>> {
        Box::pin(self.refresh(refresh_token))
    }

    fn validate_access_token<'a>(
        &'a self,
        access_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.validate_access_token(access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store(dir: &tempfile::TempDir) -> FileTokenStore {
        FileTokenStore::load(dir.path().join("tokens.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn issue_returns_distinct_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;
        let credentials = store.issue("acct1").await.unwrap();
        assert_eq!(credentials.access_token.len(), common::uid::SECRET_LEN);
        assert_eq!(credentials.refresh_token.len(), common::uid::SECRET_LEN);
        assert_ne!(credentials.access_token, credentials.refresh_token);
    }

    #[tokio::test]
    async fn refresh_mints_new_access_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;
        let credentials = store.issue("acct1").await.unwrap();

        let refreshed = store.refresh(&credentials.refresh_token).await.unwrap();
        assert_ne!(refreshed.access_token, credentials.access_token);

        let owner = store
            .validate_access_token(&refreshed.access_token)
            .await
            .unwrap();
        assert_eq!(owner, "acct1");
    }

    #[tokio::test]
    async fn refresh_does_not_rotate_the_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;
        let credentials = store.issue("acct1").await.unwrap();

        // The same refresh grant keeps working across refreshes.
        store.refresh(&credentials.refresh_token).await.unwrap();
        store.refresh(&credentials.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn expired_refresh_grant_is_invalid_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::load_with_ttls(
            dir.path().join("tokens.json"),
            DEFAULT_ACCESS_TTL,
            Duration::ZERO,
        )
        .await
        .unwrap();
        let credentials = store.issue("acct1").await.unwrap();

        let err = store.refresh(&credentials.refresh_token).await.unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }

    #[tokio::test]
    async fn unknown_refresh_token_is_invalid_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;
        let err = store.refresh("rt_never_issued").await.unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }

    #[tokio::test]
    async fn expired_access_token_is_invalid_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::load_with_ttls(
            dir.path().join("tokens.json"),
            Duration::ZERO,
            DEFAULT_REFRESH_TTL,
        )
        .await
        .unwrap();
        let credentials = store.issue("acct1").await.unwrap();

        let err = store
            .validate_access_token(&credentials.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }

    #[tokio::test]
    async fn grants_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let credentials = {
            let store = FileTokenStore::load(path.clone()).await.unwrap();
            store.issue("acct1").await.unwrap()
        };

        let store = FileTokenStore::load(path).await.unwrap();
        let owner = store
            .validate_access_token(&credentials.access_token)
            .await
            .unwrap();
        assert_eq!(owner, "acct1");
        store.refresh(&credentials.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn expired_grants_are_pruned_on_next_issue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store =
            FileTokenStore::load_with_ttls(path.clone(), Duration::ZERO, Duration::ZERO)
                .await
                .unwrap();
        store.issue("acct1").await.unwrap();
        store.issue("acct2").await.unwrap();

        // Both acct1 grants expired immediately, so the second issue
        // pruned them and the file only holds acct2's pair.
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["access"].as_object().unwrap().len(), 1);
        assert_eq!(parsed["refresh"].as_object().unwrap().len(), 1);
    }
}
