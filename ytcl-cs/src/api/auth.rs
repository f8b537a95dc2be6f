//! Authentication middleware for ytcl-cs
//!
//! Every protected route requires the static shared token in the
//! `x-labeler-token` header. Token comparison happens before any business
//! logic; a bad or missing token never reaches a handler.
//!
//! **Note:** This is applied to protected routes only.
//! Health endpoint (/health) does NOT use this middleware.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;
use ytcl_common::api::auth::{validate_token, TOKEN_HEADER};

use crate::AppState;

/// Authentication middleware
///
/// Validates the shared-token header. An empty configured token disables
/// auth checking entirely (used by tests).
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let provided = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    validate_token(&state.api_token, provided).map_err(|e| {
        warn!("Rejected request to {}: {}", request.uri().path(), e);
        AuthError(e.to_string())
    })?;

    Ok(next.run(request).await)
}

/// Authentication failure, rendered as 401 with a JSON error body
#[derive(Debug)]
pub struct AuthError(String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.0,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
