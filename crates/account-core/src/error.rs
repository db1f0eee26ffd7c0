//! Error taxonomy for account operations
//!
//! Every orchestrator operation returns one of these variants so the
//! transport layer can map each to a response without inspecting
//! messages. None of them are retried internally — each is a terminal
//! outcome for the request.

/// Errors from account operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or ambiguous creation request
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Referenced account or provider link absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Identity resolves to multiple accounts, or a uniqueness constraint
    /// was violated by a concurrent writer. Never auto-resolved: silently
    /// merging would allow account takeover via email collision.
    #[error("account conflict: {0}")]
    AccountConflict(String),

    /// External OAuth exchange failed
    #[error("provider exchange failed: {0}")]
    Provider(String),

    /// Refresh or access token invalid, expired, or revoked
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// No resolvable caller identity
    #[error("unauthenticated")]
    Unauthenticated,

    /// Storage-layer failure (I/O, serialization)
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Stable kind label for response bodies and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::AccountConflict(_) => "account_conflict",
            Error::Provider(_) => "provider_error",
            Error::InvalidToken(_) => "invalid_token",
            Error::Unauthenticated => "unauthenticated",
            Error::Storage(_) => "storage_error",
        }
    }
}

/// Result alias for account operations.
pub type Result<T> = std::result::Result<T, Error>;
