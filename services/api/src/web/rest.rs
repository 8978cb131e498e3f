//! services/api/src/web/rest.rs
//!
//! Health endpoints and the master definition for the OpenAPI specification.

use crate::web::error::{HttpError, MessageResponse};
use crate::web::state::AppState;
use crate::web::{auth, documents};
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use vedu_core::domain::{
    ComplexityAnalysis, Document, DocumentStatus, ImportantDate, JargonAnalysis, JargonInfo,
    JargonResult, ModelServiceHealth, User,
};

pub const SERVICE_NAME: &str = "vedu-backend";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::profile_handler,
        documents::list_documents_handler,
        documents::get_document_handler,
        documents::upload_document_handler,
        documents::simplify_text_handler,
        health_handler,
        model_health_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::TokenResponse,
            documents::SimplifyRequest,
            MessageResponse,
            HealthResponse,
            User,
            Document,
            DocumentStatus,
            ImportantDate,
            JargonInfo,
            JargonAnalysis,
            ComplexityAnalysis,
            JargonResult,
            ModelServiceHealth,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Vedu API", description = "Authentication and legal document analysis endpoints.")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}

/// GET /health - Liveness of this service, also served at `/api/health`
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now(),
    })
}

/// GET /api/model/health - Reachability of the classification service
#[utoipa::path(
    get,
    path = "/api/model/health",
    responses(
        (status = 200, description = "Model service answered", body = ModelServiceHealth),
        (status = 503, description = "Model service unreachable", body = MessageResponse)
    )
)]
pub async fn model_health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelServiceHealth>, HttpError> {
    state.classifier.health().await.map(Json).map_err(|e| {
        warn!("Model service health check failed: {:?}", e);
        HttpError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Model API service is unavailable",
        )
    })
}
