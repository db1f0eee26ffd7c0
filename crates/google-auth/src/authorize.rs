//! Authorization URL construction for the Google web-server flow
//!
//! Builds the URL the user's browser is sent to. `access_type=offline`
//! plus `prompt=consent` make Google return a refresh token on exchange;
//! without them only an access token comes back and the stored provider
//! link could never be refreshed.

use crate::constants::{AUTHORIZE_ENDPOINT, SCOPES};

/// Build the full authorization URL with all required OAuth parameters.
///
/// The `state` parameter is an opaque value the client generates for CSRF
/// protection. Google returns it unchanged in the callback.
pub fn build_authorization_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
        AUTHORIZE_ENDPOINT,
        urlencoded(client_id),
        urlencoded(redirect_uri),
        urlencoded(SCOPES),
        state,
    )
}

/// Minimal URL encoding for parameter values.
/// Only encodes characters that would break URL parameter parsing.
fn urlencoded(s: &str) -> String {
    s.replace(' ', "%20")
        .replace(':', "%3A")
        .replace('/', "%2F")
}
