pub mod auth;
pub mod documents;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod uploads;

pub use middleware::require_auth;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::MAX_UPLOAD_BYTES;
use state::AppState;

/// Multipart framing overhead allowed on top of the file itself, so a file
/// just over the limit reaches the explicit size check.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Builds the application router. CORS and Swagger UI are layered on by the binary.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/auth/signup", post(auth::signup_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/health", get(rest::health_handler))
        .route("/api/health", get(rest::health_handler))
        .route("/api/model/health", get(rest::model_health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/profile", get(auth::profile_handler))
        .route("/api/documents", get(documents::list_documents_handler))
        .route("/api/documents/upload", post(documents::upload_document_handler))
        .route(
            "/api/documents/simplify-text",
            post(documents::simplify_text_handler),
        )
        .route("/api/documents/{id}", get(documents::get_document_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + BODY_LIMIT_SLACK))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
