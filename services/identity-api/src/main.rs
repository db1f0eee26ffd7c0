//! Account-identity API
//!
//! Single-binary Rust service that:
//! 1. Loads TOML configuration and the Google client secret
//! 2. Opens the durable account and token stores
//! 3. Wires the Google OAuth adapter into the account orchestrator
//! 4. Serves the authentication routes over axum

mod config;
mod error;
mod metrics;
mod provider_impl;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use account_core::AccountService;
use account_store::{FileAccountStore, FileTokenStore};
use anyhow::{Context, Result};
use google_auth::GoogleClient;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::provider_impl::GoogleIdentityProvider;
use crate::routes::{AppState, build_router};

/// Outbound HTTP timeout for the Google endpoints. Exchange latency is
/// bounded here, never by a storage lock — the orchestrator only touches
/// storage after the exchange completes.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config_path = Config::resolve_path(std::env::args().nth(1).as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;

    let prometheus = metrics::install_recorder();

    let accounts = Arc::new(
        FileAccountStore::load(config.storage.accounts_path.clone())
            .await
            .context("opening account store")?,
    );
    let tokens = Arc::new(
        FileTokenStore::load_with_ttls(
            config.storage.tokens_path.clone(),
            Duration::from_secs(config.tokens.access_ttl_secs),
            Duration::from_secs(config.tokens.refresh_ttl_secs),
        )
        .await
        .context("opening token store")?,
    );

    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()
        .context("building HTTP client")?;
    let client_secret = config
        .google
        .client_secret
        .as_ref()
        .context("google client secret not configured")?
        .expose()
        .clone();
    let google = GoogleClient::new(http, config.google.client_id.clone(), client_secret);
    let provider = Arc::new(GoogleIdentityProvider::new(
        google,
        config.google.redirect_uri.clone(),
    ));

    let service = Arc::new(AccountService::new(accounts, provider, tokens.clone()));

    let state = AppState {
        service,
        issuer: tokens,
        google_client_id: config.google.client_id.clone(),
        google_redirect_uri: config.google.redirect_uri.clone(),
        prometheus,
    };
    let router = build_router(state, config.server.max_connections);

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "identity api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("identity api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received, draining connections");
    }
}
