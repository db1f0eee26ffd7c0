//! Account domain model
//!
//! An `Account` is the canonical identity record for one user. It owns
//! its `AccountConfig` (created atomically with the account) and carries
//! its provider links inline — links back-reference the account by id.
//!
//! Timestamps are unix milliseconds (absolute, not deltas), computed at
//! storage time.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// External sign-in provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignInProvider {
    Google,
}

impl SignInProvider {
    /// Provider label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SignInProvider::Google => "google",
        }
    }
}

/// Per-account settings, created atomically with the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub timezone: String,
}

/// One external OAuth identity bound to one account, with cached tokens.
///
/// (account_id, provider, provider_id) is unique; additionally a
/// (provider, provider_id) pair resolves to at most one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderLink {
    pub account_id: String,
    pub provider: SignInProvider,
    pub provider_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Provider token expiration as unix timestamp in milliseconds
    pub expires_at: u64,
}

/// The canonical identity record for one user.
///
/// An account always has at least one identity channel: email, phone, or
/// a provider link. `email` and `phone` are set at creation; provider
/// linking never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Opaque 16-char token, globally unique, immutable
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Creation time as unix timestamp in milliseconds, immutable
    pub created_at: u64,
    pub config: AccountConfig,
    #[serde(default)]
    pub providers: Vec<ProviderLink>,
}

impl Account {
    /// First link of the given provider kind, if any.
    pub fn link_for(&self, provider: SignInProvider) -> Option<&ProviderLink> {
        self.providers.iter().find(|l| l.provider == provider)
    }

    /// Whether this account holds the exact (provider, provider_id) pair.
    pub fn has_provider_pair(&self, provider: SignInProvider, provider_id: &str) -> bool {
        self.providers
            .iter()
            .any(|l| l.provider == provider && l.provider_id == provider_id)
    }
}

/// Provider token material attached at account creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleLink {
    /// Google's subject identifier for the user
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: u64,
}

/// Creation request — a tagged union with exactly one populated arm.
///
/// The shapes mirror the three sign-in channels. Validation happens at
/// the boundary via [`CreateInput::validate`], not by shape-sniffing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum CreateInput {
    Email {
        email: String,
        timezone: String,
    },
    Phone {
        phone: String,
        timezone: String,
    },
    Google {
        email: String,
        timezone: String,
        google: GoogleLink,
    },
}

impl CreateInput {
    /// Reject shapes with empty identity fields.
    pub fn validate(&self) -> Result<()> {
        let (identity, timezone) = match self {
            CreateInput::Email { email, timezone } => (email, timezone),
            CreateInput::Phone { phone, timezone } => (phone, timezone),
            CreateInput::Google {
                email,
                timezone,
                google,
            } => {
                if google.id.is_empty() {
                    return Err(Error::InvalidInput("empty provider id".into()));
                }
                (email, timezone)
            }
        };
        if identity.is_empty() {
            return Err(Error::InvalidInput("empty identity field".into()));
        }
        if timezone.is_empty() {
            return Err(Error::InvalidInput("empty timezone".into()));
        }
        Ok(())
    }

    pub fn timezone(&self) -> &str {
        match self {
            CreateInput::Email { timezone, .. }
            | CreateInput::Phone { timezone, .. }
            | CreateInput::Google { timezone, .. } => timezone,
        }
    }
}

/// Upsert request for a provider link's token fields, keyed by
/// (account_id, provider, provider_id).
#[derive(Debug, Clone)]
pub struct UpdateProviderTokens {
    pub account_id: String,
    pub provider: SignInProvider,
    pub provider_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google_arm() -> CreateInput {
        CreateInput::Google {
            email: "person@example.com".into(),
            timezone: "America/New_York".into(),
            google: GoogleLink {
                id: "108177".into(),
                access_token: "ya29.at".into(),
                refresh_token: "1//rt".into(),
                expires_at: 1_735_500_000_000,
            },
        }
    }

    #[test]
    fn validate_accepts_well_formed_arms() {
        CreateInput::Email {
            email: "person@example.com".into(),
            timezone: "UTC".into(),
        }
        .validate()
        .unwrap();
        CreateInput::Phone {
            phone: "+15551234".into(),
            timezone: "UTC".into(),
        }
        .validate()
        .unwrap();
        google_arm().validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_identity() {
        let err = CreateInput::Email {
            email: "".into(),
            timezone: "UTC".into(),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn validate_rejects_empty_provider_id() {
        let err = CreateInput::Google {
            email: "person@example.com".into(),
            timezone: "UTC".into(),
            google: GoogleLink {
                id: "".into(),
                access_token: "at".into(),
                refresh_token: "rt".into(),
                expires_at: 0,
            },
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn validate_rejects_empty_timezone() {
        let err = CreateInput::Phone {
            phone: "+15551234".into(),
            timezone: "".into(),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn account_resolves_provider_links() {
        let account = Account {
            id: "acct123".into(),
            email: Some("person@example.com".into()),
            phone: None,
            created_at: 0,
            config: AccountConfig {
                timezone: "UTC".into(),
            },
            providers: vec![ProviderLink {
                account_id: "acct123".into(),
                provider: SignInProvider::Google,
                provider_id: "108177".into(),
                access_token: "at".into(),
                refresh_token: "rt".into(),
                expires_at: 0,
            }],
        };
        assert_eq!(
            account.link_for(SignInProvider::Google).unwrap().provider_id,
            "108177"
        );
        assert!(account.has_provider_pair(SignInProvider::Google, "108177"));
        assert!(!account.has_provider_pair(SignInProvider::Google, "other"));
    }
}
