//! Error types for Google OAuth operations

/// Errors from Google OAuth operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("userinfo lookup failed: {0}")]
    Userinfo(String),
}

/// Result alias for Google OAuth operations.
pub type Result<T> = std::result::Result<T, Error>;
