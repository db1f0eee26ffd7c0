//! Durable account store
//!
//! Maps account ids to account records (attributes, config, provider
//! links) in a JSON file. The Mutex serializes all mutations; each
//! operation takes the lock once, mutates, and performs one atomic file
//! write, so account + config + initial-link creation is a single
//! transaction. The store is the final arbiter of the uniqueness
//! constraints — the second writer of a duplicate email, phone, or
//! provider pair is rejected with `AccountConflict`.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use account_core::{
    Account, AccountConfig, AccountRepository, CreateInput, Error, ProviderLink, Result,
    SignInProvider, UpdateProviderTokens,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::fsutil::{load_or_init, write_atomic};
use crate::now_millis;

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountState {
    accounts: HashMap<String, Account>,
}

/// Thread-safe account file store.
pub struct FileAccountStore {
    path: PathBuf,
    state: Mutex<AccountState>,
}

impl FileAccountStore {
    /// Load accounts from the given file path, creating an empty store
    /// file on cold start.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state: AccountState = load_or_init(&path, "accounts").await?;
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.state.lock().await.accounts.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Create an account with a freshly allocated id.
    ///
    /// The account row, its config, and — for the Google arm — the
    /// initial provider link are written in one transaction.
    pub async fn create(&self, input: CreateInput) -> Result<Account> {
        input.validate()?;

        let mut state = self.state.lock().await;

        match &input {
            CreateInput::Email { email, .. } => {
                Self::ensure_email_free(&state, email)?;
            }
            CreateInput::Phone { phone, .. } => {
                if state
                    .accounts
                    .values()
                    .any(|a| a.phone.as_deref() == Some(phone))
                {
                    return Err(Error::AccountConflict(format!(
                        "phone {phone} already registered"
                    )));
                }
            }
            CreateInput::Google { email, google, .. } => {
                Self::ensure_email_free(&state, email)?;
                if state
                    .accounts
                    .values()
                    .any(|a| a.has_provider_pair(SignInProvider::Google, &google.id))
                {
                    return Err(Error::AccountConflict(format!(
                        "google identity {} already linked",
                        google.id
                    )));
                }
            }
        }

        let id = common::uid::generate_id();
        let timezone = input.timezone().to_owned();
        let account = match input {
            CreateInput::Email { email, .. } => Account {
                id: id.clone(),
                email: Some(email),
                phone: None,
                created_at: now_millis(),
                config: AccountConfig { timezone },
                providers: vec![],
            },
            CreateInput::Phone { phone, .. } => Account {
                id: id.clone(),
                email: None,
                phone: Some(phone),
                created_at: now_millis(),
                config: AccountConfig { timezone },
                providers: vec![],
            },
            CreateInput::Google { email, google, .. } => Account {
                id: id.clone(),
                email: Some(email),
                phone: None,
                created_at: now_millis(),
                config: AccountConfig { timezone },
                providers: vec![ProviderLink {
                    account_id: id.clone(),
                    provider: SignInProvider::Google,
                    provider_id: google.id,
                    access_token: google.access_token,
                    refresh_token: google.refresh_token,
                    expires_at: google.expires_at,
                }],
            },
        };

        state.accounts.insert(id.clone(), account.clone());
        write_atomic(&self.path, &*state, "accounts").await?;
        debug!(account_id = id, "account created");
        Ok(account)
    }

    fn ensure_email_free(state: &AccountState, email: &str) -> Result<()> {
        if state
            .accounts
            .values()
            .any(|a| a.email.as_deref() == Some(email))
        {
            return Err(Error::AccountConflict(format!(
                "email {email} already registered"
            )));
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(id).cloned())
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned())
    }

    pub async fn get_by_phone(&self, phone: &str) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.phone.as_deref() == Some(phone))
            .cloned())
    }

    pub async fn get_by_provider(
        &self,
        provider: SignInProvider,
        provider_id: &str,
    ) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.has_provider_pair(provider, provider_id))
            .cloned())
    }

    pub async fn get_many_by_provider(
        &self,
        provider: SignInProvider,
        provider_id: &str,
        email: Option<&str>,
    ) -> Result<Vec<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .filter(|a| {
                a.has_provider_pair(provider, provider_id)
                    || (email.is_some() && a.email.as_deref() == email)
            })
            .cloned()
            .collect())
    }

    /// Upsert a provider link's tokens, keyed by
    /// (account_id, provider, provider_id).
    pub async fn update_provider_tokens(&self, update: UpdateProviderTokens) -> Result<()> {
        let mut state = self.state.lock().await;

        // The pair may belong to at most one account.
        if state.accounts.values().any(|a| {
            a.id != update.account_id && a.has_provider_pair(update.provider, &update.provider_id)
        }) {
            return Err(Error::AccountConflict(format!(
                "{} identity {} already linked to another account",
                update.provider.label(),
                update.provider_id
            )));
        }

        let account = state
            .accounts
            .get_mut(&update.account_id)
            .ok_or_else(|| Error::NotFound(format!("account {}", update.account_id)))?;

        match account
            .providers
            .iter_mut()
            .find(|l| l.provider == update.provider && l.provider_id == update.provider_id)
        {
            Some(link) => {
                link.access_token = update.access_token;
                link.refresh_token = update.refresh_token;
                link.expires_at = update.expires_at;
            }
            None => account.providers.push(ProviderLink {
                account_id: update.account_id.clone(),
                provider: update.provider,
                provider_id: update.provider_id.clone(),
                access_token: update.access_token,
                refresh_token: update.refresh_token,
                expires_at: update.expires_at,
            }),
        }

        write_atomic(&self.path, &*state, "accounts").await?;
        debug!(
            account_id = update.account_id,
            provider = update.provider.label(),
            "provider tokens upserted"
        );
        Ok(())
    }
}

impl AccountRepository for FileAccountStore {
    fn create(
        &self,
        input: CreateInput,
    ) -> Pin<Box<dyn Future<Output = Result<Account>> + Send + '_>> {
        Box::pin(self.create(input))
    }

    fn get_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Account>>> + Send + 'a>> {
        Box::pin(self.get_by_id(id))
    }

    fn get_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Account>>> + Send + 'a>> {
        Box::pin(self.get_by_email(email))
    }

    fn get_by_phone<'a>(
        &'a self,
        phone: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Account>>> + Send + 'a>> {
        Box::pin(self.get_by_phone(phone))
    }

    fn get_by_provider<'a>(
        &'a self,
        provider: SignInProvider,
        provider_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Account>>> + Send + 'a>> {
        Box::pin(self.get_by_provider(provider, provider_id))
    }

    fn get_many_by_provider<'a>(
        &'a self,
        provider: SignInProvider,
        provider_id: &'a str,
        email: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Account>>> + Send + 'a>> {
        Box::pin(self.get_many_by_provider(provider, provider_id, email))
    }

    fn update_provider_tokens(
        &self,
        update: UpdateProviderTokens,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.update_provider_tokens(update))
    }
}
