//! HTTP surface for the account orchestrator
//!
//! One route per orchestrator operation, plus the authorization-URL
//! helper, `/health`, and `/metrics`. Handlers stay thin: decode the
//! request, call the service, map the result through `ApiError`.

use std::sync::Arc;

use account_core::{
    AccountService, AuthOutput, CreateFromEmail, CreateFromGoogle, CreateFromPhone,
    CredentialIssuer, ExchangeCode, Iam, IamOutput, RefreshOutput, RefreshToken,
};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::error::ApiError;
use crate::metrics::{record_refresh, record_sign_in};

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AccountService>,
    pub issuer: Arc<dyn CredentialIssuer>,
    pub google_client_id: String,
    pub google_redirect_uri: String,
    pub prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
///
/// Applies a concurrency limit layer based on `max_connections`.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .route("/auth/google/url", get(google_auth_url))
        .route("/auth/google", post(sign_in_google))
        .route("/auth/email", post(sign_in_email))
        .route("/auth/phone", post(sign_in_phone))
        .route("/auth/code", post(exchange_code))
        .route("/auth/refresh", post(refresh_token))
        .route("/iam", get(iam))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn render_metrics(State(state): State<AppState>) -> String {
    state.prometheus.render()
}

/// GET /auth/google/url — authorization URL plus a fresh CSRF state.
async fn google_auth_url(State(state): State<AppState>) -> Json<serde_json::Value> {
    let csrf_state = common::uid::generate_secret();
    let authorization_url = google_auth::build_authorization_url(
        &state.google_client_id,
        &state.google_redirect_uri,
        &csrf_state,
    );
    Json(serde_json::json!({
        "authorization_url": authorization_url,
        "state": csrf_state,
    }))
}

/// POST /auth/google — code exchange sign-in (create, link, or reject).
async fn sign_in_google(
    State(state): State<AppState>,
    Json(input): Json<CreateFromGoogle>,
) -> Result<Json<AuthOutput>, ApiError> {
    match state.service.create_from_google_provider(input).await {
        Ok(output) => {
            let outcome = if output.is_first_access.is_some() {
                "created"
            } else {
                "linked"
            };
            record_sign_in("google", outcome);
            Ok(Json(output))
        }
        Err(err) => {
            record_sign_in("google", err.kind());
            Err(err.into())
        }
    }
}

/// POST /auth/email — idempotent identity registration, no credentials.
async fn sign_in_email(
    State(state): State<AppState>,
    Json(input): Json<CreateFromEmail>,
) -> Result<StatusCode, ApiError> {
    match state.service.create_from_email_provider(input).await {
        Ok(()) => {
            record_sign_in("email", "ok");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            record_sign_in("email", err.kind());
            Err(err.into())
        }
    }
}

/// POST /auth/phone — idempotent identity registration, no credentials.
async fn sign_in_phone(
    State(state): State<AppState>,
    Json(input): Json<CreateFromPhone>,
) -> Result<StatusCode, ApiError> {
    match state.service.create_from_phone_provider(input).await {
        Ok(()) => {
            record_sign_in("phone", "ok");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            record_sign_in("phone", err.kind());
            Err(err.into())
        }
    }
}

/// POST /auth/code — re-consent exchange for a known account.
async fn exchange_code(
    State(state): State<AppState>,
    Json(input): Json<ExchangeCode>,
) -> Result<Json<AuthOutput>, ApiError> {
    let output = state.service.exchange_code(input).await?;
    Ok(Json(output))
}

/// POST /auth/refresh — new access token from a refresh grant.
async fn refresh_token(
    State(state): State<AppState>,
    Json(input): Json<RefreshToken>,
) -> Result<Json<RefreshOutput>, ApiError> {
    match state.service.refresh_token(input).await {
        Ok(output) => {
            record_refresh("ok");
            Ok(Json(output))
        }
        Err(err) => {
            record_refresh(err.kind());
            Err(err.into())
        }
    }
}

/// GET /iam — canonical identity of the bearer-token caller.
async fn iam(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<IamOutput>, ApiError> {
    let id = match bearer_token(&headers) {
        Some(token) => Some(state.issuer.validate_access_token(token).await?),
        None => None,
    };
    let output = state.service.iam(Iam { id }).await?;
    Ok(Json(output))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
