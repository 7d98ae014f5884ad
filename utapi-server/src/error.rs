//! Maps engine and transport failures onto HTTP status codes (SPEC_FULL.md
//! §4.9: extends the core's two-kind taxonomy with the outer surface's own
//! failure modes — bad request bodies and authentication).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use utapi_core::UtapiError;

use crate::auth::AuthError;

/// Every way a request can fail once it reaches a handler.
#[derive(Debug)]
pub enum ApiError {
    /// `AuthError` from [`crate::auth::verify`]. Always HTTP 403.
    Unauthenticated(AuthError),
    /// A request body that didn't parse or didn't name a recognized action.
    BadRequest(String),
    /// [`UtapiError`] from the write or read path.
    Engine(UtapiError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Unauthenticated(err)
    }
}

impl From<UtapiError> for ApiError {
    fn from(err: UtapiError) -> Self {
        Self::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthenticated(err) => {
                tracing::warn!(error = %err, "request authentication failed");
                (StatusCode::FORBIDDEN, "authentication failed".to_string())
            }
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            Self::Engine(UtapiError::Precondition(reason)) => (StatusCode::BAD_REQUEST, reason.clone()),
            Self::Engine(err @ UtapiError::Internal(_)) => {
                tracing::error!(error = %err, "internal error handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
