//! Google OAuth endpoint constants
//!
//! Public endpoint configuration for Google's OAuth 2.0 web-server flow.
//! The client id and secret are deployment configuration, not constants —
//! they come from the service config and are passed to `GoogleClient`.

/// Authorization endpoint the user's browser is sent to
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Token endpoint for authorization-code exchange
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Userinfo endpoint that resolves an access token to the Google profile
pub const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// OAuth scopes required for account linking.
/// `openid` + `email` give us the stable subject id and the address used
/// to unite Google sign-ins with existing email/phone accounts; `profile`
/// covers display fields.
pub const SCOPES: &str = "openid email profile";
