//! Storage abstraction for accounts and provider links
//!
//! The orchestrator receives the repository by construction, which keeps
//! the business rules substitutable over durable storage and in-memory
//! fakes. Absence is a normal outcome: every lookup returns `Ok(None)`
//! (or an empty vec), never an error. The repository is the final arbiter
//! of the uniqueness constraints — a concurrent duplicate-create is
//! rejected here with `AccountConflict`.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn AccountRepository>`).

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::model::{Account, CreateInput, SignInProvider, UpdateProviderTokens};

/// Durable mapping from account identity to its attributes and linked
/// sign-in providers.
pub trait AccountRepository: Send + Sync {
    /// Create an account (and its config, and — for the Google arm — the
    /// initial provider link) atomically. Allocates the account id.
    ///
    /// Fails with `InvalidInput` on a malformed shape and with
    /// `AccountConflict` when email, phone, or the provider pair is
    /// already taken.
    fn create(
        &self,
        input: CreateInput,
    ) -> Pin<Box<dyn Future<Output = Result<Account>> + Send + '_>>;

    fn get_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Account>>> + Send + 'a>>;

    fn get_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Account>>> + Send + 'a>>;

    fn get_by_phone<'a>(
        &'a self,
        phone: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Account>>> + Send + 'a>>;

    /// Resolve the unique account holding the (provider, provider_id)
    /// pair. Direct existence-match semantics.
    fn get_by_provider<'a>(
        &'a self,
        provider: SignInProvider,
        provider_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Account>>> + Send + 'a>>;

    /// All accounts matching the provider pair OR the given email.
    ///
    /// Used to detect ambiguous identity situations before linking; an
    /// empty vec is the no-match outcome, never an error.
    fn get_many_by_provider<'a>(
        &'a self,
        provider: SignInProvider,
        provider_id: &'a str,
        email: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Account>>> + Send + 'a>>;

    /// Upsert a provider link's token fields, keyed by
    /// (account_id, provider, provider_id): created if absent, token
    /// fields overwritten otherwise.
    fn update_provider_tokens(
        &self,
        update: UpdateProviderTokens,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
