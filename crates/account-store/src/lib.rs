//! Durable storage for the account-identity service
//!
//! Two JSON-file-backed stores implementing the `account-core` traits:
//! `FileAccountStore` (accounts, configs, provider links) and
//! `FileTokenStore` (issued session credentials). Both persist their
//! whole state with atomic temp-file + rename writes; a tokio Mutex
//! serializes mutations, so each logical operation is a single
//! storage-layer transaction. The files are the single source of truth —
//! a missing file on load is a cold start with zero records.

mod accounts;
mod fsutil;
mod tokens;

pub use accounts::FileAccountStore;
pub use tokens::FileTokenStore;

/// Current time as a unix timestamp in milliseconds.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
