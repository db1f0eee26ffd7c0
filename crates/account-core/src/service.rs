//! Account orchestrator — the authentication core
//!
//! Implements the business rules per sign-in channel: create-or-find
//! semantics for email and phone, the Google code-exchange and linking
//! state machine, the re-consent exchange for known accounts, token
//! refresh, and caller identity resolution.
//!
//! Every operation is request-scoped; no state machine persists between
//! calls. The OAuth exchange network call always completes before any
//! storage mutation, so provider latency never blocks a storage lock.
//!
//! Linking policy: email is the uniting key across channels, the
//! provider id is the uniting key across repeated Google sign-ins. A
//! lookup matching more than one account is always an error — never
//! resolved by implicit preference.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::credentials::CredentialIssuer;
use crate::error::{Error, Result};
use crate::model::{CreateInput, GoogleLink, SignInProvider, UpdateProviderTokens};
use crate::provider::IdentityProvider;
use crate::repository::AccountRepository;

/// Input for the email channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFromEmail {
    pub email: String,
    pub timezone: String,
}

/// Input for the phone channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFromPhone {
    pub phone: String,
    pub timezone: String,
}

/// Input for the Google channel. `origin_url` is the redirect URI the
/// authorization code was issued against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFromGoogle {
    pub code: String,
    pub origin_url: String,
    pub timezone: String,
}

/// Input for the re-consent exchange on an already-known account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeCode {
    pub account_id: String,
    pub code: String,
}

/// Input for token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub refresh_token: String,
}

/// Input for identity resolution. `id` is typically extracted from a
/// validated access token upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Iam {
    pub id: Option<String>,
}

/// Credential pair returned by successful authentication paths.
/// `is_first_access` is present only when the call created the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_first_access: Option<bool>,
}

/// New access token from a refresh. The refresh token is unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshOutput {
    pub access_token: String,
    pub expires_at: u64,
}

/// Canonical caller identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IamOutput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
}

/// The authentication core. Collaborators are injected by construction
/// so tests can substitute in-memory fakes.
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    provider: Arc<dyn IdentityProvider>,
    issuer: Arc<dyn CredentialIssuer>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        provider: Arc<dyn IdentityProvider>,
        issuer: Arc<dyn CredentialIssuer>,
    ) -> Self {
        Self {
            repository,
            provider,
            issuer,
        }
    }

    /// Email channel: create-or-find by email, idempotent.
    ///
    /// Registers identity only — no credentials are issued here; the
    /// caller authenticates through a separate step.
    pub async fn create_from_email_provider(&self, input: CreateFromEmail) -> Result<()> {
        if input.email.is_empty() {
            return Err(Error::InvalidInput("empty email".into()));
        }
        if let Some(existing) = self.repository.get_by_email(&input.email).await? {
            debug!(account_id = existing.id, "email already registered");
            return Ok(());
        }
        let account = self
            .repository
            .create(CreateInput::Email {
                email: input.email,
                timezone: input.timezone,
            })
            .await?;
        info!(account_id = account.id, channel = "email", "account created");
        Ok(())
    }

    /// Phone channel: create-or-find by phone, idempotent.
    pub async fn create_from_phone_provider(&self, input: CreateFromPhone) -> Result<()> {
        if input.phone.is_empty() {
            return Err(Error::InvalidInput("empty phone".into()));
        }
        if let Some(existing) = self.repository.get_by_phone(&input.phone).await? {
            debug!(account_id = existing.id, "phone already registered");
            return Ok(());
        }
        let account = self
            .repository
            .create(CreateInput::Phone {
                phone: input.phone,
                timezone: input.timezone,
            })
            .await?;
        info!(account_id = account.id, channel = "phone", "account created");
        Ok(())
    }

    /// Google channel: exchange the code, then create, link, or reject.
    ///
    /// Zero matching accounts creates one (first access); exactly one
    /// match upserts its provider tokens — covering both the returning
    /// Google user and the email/phone account now also linking Google.
    /// More than one match means the provider id and the email point at
    /// different accounts, which is surfaced as a conflict with no
    /// storage mutation.
    pub async fn create_from_google_provider(&self, input: CreateFromGoogle) -> Result<AuthOutput> {
        if input.code.is_empty() {
            return Err(Error::InvalidInput("empty authorization code".into()));
        }
        let identity = self
            .provider
            .exchange_code(&input.code, Some(&input.origin_url))
            .await?;
        let provider = self.provider.provider();

        let matches = self
            .repository
            .get_many_by_provider(provider, &identity.provider_id, Some(&identity.email))
            .await?;

        match matches.as_slice() {
            [] => {
                let account = self
                    .repository
                    .create(CreateInput::Google {
                        email: identity.email,
                        timezone: input.timezone,
                        google: GoogleLink {
                            id: identity.provider_id,
                            access_token: identity.access_token,
                            refresh_token: identity.refresh_token,
                            expires_at: identity.expires_at,
                        },
                    })
                    .await?;
                info!(
                    account_id = account.id,
                    channel = provider.label(),
                    "account created on first provider sign-in"
                );
                let credentials = self.issuer.issue(&account.id).await?;
                Ok(AuthOutput {
                    access_token: credentials.access_token,
                    refresh_token: credentials.refresh_token,
                    expires_at: credentials.expires_at,
                    is_first_access: Some(true),
                })
            }
            [account] => {
                self.repository
                    .update_provider_tokens(UpdateProviderTokens {
                        account_id: account.id.clone(),
                        provider,
                        provider_id: identity.provider_id,
                        access_token: identity.access_token,
                        refresh_token: identity.refresh_token,
                        expires_at: identity.expires_at,
                    })
                    .await?;
                debug!(
                    account_id = account.id,
                    channel = provider.label(),
                    "provider tokens upserted for returning sign-in"
                );
                let credentials = self.issuer.issue(&account.id).await?;
                Ok(AuthOutput {
                    access_token: credentials.access_token,
                    refresh_token: credentials.refresh_token,
                    expires_at: credentials.expires_at,
                    is_first_access: None,
                })
            }
            many => {
                warn!(
                    matches = many.len(),
                    channel = provider.label(),
                    "provider identity resolves to multiple accounts"
                );
                Err(Error::AccountConflict(format!(
                    "provider identity resolves to {} accounts",
                    many.len()
                )))
            }
        }
    }

    /// Re-consent exchange for an already-known account: re-exchanges a
    /// fresh code and upserts the provider link tokens.
    pub async fn exchange_code(&self, input: ExchangeCode) -> Result<AuthOutput> {
        let account = self
            .repository
            .get_by_id(&input.account_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("account {}", input.account_id)))?;

        // The code was issued against the provider's configured redirect
        // URI — no origin travels with a re-consent request.
        let identity = self.provider.exchange_code(&input.code, None).await?;

        self.repository
            .update_provider_tokens(UpdateProviderTokens {
                account_id: account.id.clone(),
                provider: self.provider.provider(),
                provider_id: identity.provider_id,
                access_token: identity.access_token,
                refresh_token: identity.refresh_token,
                expires_at: identity.expires_at,
            })
            .await?;
        debug!(account_id = account.id, "provider tokens re-exchanged");

        let credentials = self.issuer.issue(&account.id).await?;
        Ok(AuthOutput {
            access_token: credentials.access_token,
            refresh_token: credentials.refresh_token,
            expires_at: credentials.expires_at,
            is_first_access: None,
        })
    }

    /// Mint a new access token from a refresh grant. The refresh token
    /// is not rotated.
    pub async fn refresh_token(&self, input: RefreshToken) -> Result<RefreshOutput> {
        let refreshed = self.issuer.refresh(&input.refresh_token).await?;
        Ok(RefreshOutput {
            access_token: refreshed.access_token,
            expires_at: refreshed.expires_at,
        })
    }

    /// Resolve the canonical caller identity.
    pub async fn iam(&self, input: Iam) -> Result<IamOutput> {
        let id = input.id.ok_or(Error::Unauthenticated)?;
        let account = self
            .repository
            .get_by_id(&id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("account {id}")))?;
        let google_id = account
            .link_for(SignInProvider::Google)
            .map(|link| link.provider_id.clone());
        Ok(IamOutput {
            id: account.id,
            google_id,
        })
    }
}
