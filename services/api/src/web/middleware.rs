//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::error::HttpError;
use crate::web::state::AppState;

/// The token of an `Authorization: Bearer <token>` header. The scheme is
/// case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware that validates the bearer token and extracts the user_id.
///
/// If valid, inserts the user_id (`Uuid`) into request extensions for handlers
/// to use. If missing or invalid, returns 401 without touching any store.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| HttpError::unauthorized("No token, authorization denied"))?;

    // 2. Verify it and recover the user id
    let user_id = state.tokens.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        HttpError::unauthorized("Token is not valid")
    })?;

    // 3. Insert user_id into request extensions
    req.extensions_mut().insert(user_id);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
