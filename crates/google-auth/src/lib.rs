//! Google OAuth authentication library
//!
//! Provides authorization URL construction, authorization-code exchange,
//! and userinfo profile lookup for the Google sign-in channel. This crate
//! is a standalone library with no dependency on the service binary — it
//! can be tested and used independently.
//!
//! Sign-in flow:
//! 1. Client opens the URL from `authorize::build_authorization_url()`
//! 2. Google redirects back with an authorization code
//! 3. Service calls `GoogleClient::exchange_code()` with the code
//! 4. Service calls `GoogleClient::fetch_profile()` with the access token
//!    to learn the Google subject id and email for account linking

pub mod authorize;
pub mod constants;
pub mod error;
pub mod token;

pub use authorize::build_authorization_url;
pub use constants::*;
pub use error::{Error, Result};
pub use token::{GoogleClient, GoogleProfile, TokenResponse};
