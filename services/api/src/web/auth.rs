//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and the profile lookup.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;
use vedu_core::domain::{NewUser, User};
use vedu_core::ports::PortError;

use crate::security::{hash_password, verify_password};
use crate::web::error::{HttpError, JsonBody, MessageResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = MessageResponse),
        (status = 400, description = "Email already registered or missing fields", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = req.email.trim().to_string();
    if req.first_name.trim().is_empty()
        || req.last_name.trim().is_empty()
        || email.is_empty()
        || req.password.is_empty()
    {
        return Err(HttpError::bad_request("All fields are required"));
    }

    // 1. Reject known emails before paying for a hash
    let existing = state.users.find_by_email(&email).await.map_err(|e| {
        error!("Failed to look up user: {:?}", e);
        HttpError::internal("Server error")
    })?;
    if existing.is_some() {
        return Err(HttpError::bad_request("User already exists"));
    }

    // 2. Hash the password
    let password_hash = hash_password(&req.password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        HttpError::internal("Server error")
    })?;

    // 3. Create user; the unique index still guards concurrent signups
    let user = state
        .users
        .create(NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            PortError::DuplicateEmail => HttpError::bad_request("User already exists"),
            other => {
                error!("Failed to create user: {:?}", other);
                HttpError::internal("Server error")
            }
        })?;

    info!("Created user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

/// POST /api/auth/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, HttpError> {
    // 1. Get user by email
    let creds = state
        .users
        .find_by_email(req.email.trim())
        .await
        .map_err(|e| {
            error!("Failed to get user: {:?}", e);
            HttpError::internal("Server error")
        })?
        .ok_or_else(|| HttpError::bad_request("Invalid credentials"))?;

    // 2. Verify password
    let valid = verify_password(&req.password, &creds.password_hash).map_err(|e| {
        error!("Stored password hash for {} is unusable: {:?}", creds.id, e);
        HttpError::internal("Server error")
    })?;
    if !valid {
        return Err(HttpError::bad_request("Invalid credentials"));
    }

    // 3. Issue the token
    let token = state.tokens.issue(creds.id).map_err(|e| {
        error!("Failed to issue token: {:?}", e);
        HttpError::internal("Server error")
    })?;

    Ok(Json(TokenResponse { token }))
}

/// GET /api/auth/profile - The authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 404, description = "User no longer exists", body = MessageResponse)
    ),
    security(("bearer" = []))
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<User>, HttpError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load profile: {:?}", e);
            HttpError::internal("Server error")
        })?
        .ok_or_else(|| HttpError::not_found("User not found"))?;
    Ok(Json(user))
}
