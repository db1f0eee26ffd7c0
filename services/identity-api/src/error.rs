//! HTTP mapping for the account error taxonomy
//!
//! Each taxonomy variant maps to one status code so clients can branch
//! on status without parsing messages. The JSON body carries the stable
//! kind label plus the human-readable detail.

use account_core::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Wrapper making the core taxonomy an axum response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// Status code for a taxonomy variant.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::AccountConflict(_) => StatusCode::CONFLICT,
        Error::Provider(_) => StatusCode::BAD_GATEWAY,
        Error::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        Error::Unauthenticated => StatusCode::UNAUTHORIZED,
        Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(serde_json::json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
