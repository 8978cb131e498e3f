//! services/api/src/web/documents.rs
//!
//! Handlers for listing, fetching and uploading documents, and for standalone
//! jargon simplification.

use axum::{
    body::Bytes,
    extract::{multipart::{MultipartError, MultipartRejection}, Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use vedu_core::domain::{
    ClassificationResult, Document, DocumentStatus, JargonResult, NewDocument,
};
use vedu_core::ports::{DocumentStore, PortError};

use crate::config::MAX_UPLOAD_BYTES;
use crate::web::error::{HttpError, JsonBody, MessageResponse};
use crate::web::state::AppState;
use crate::web::uploads::{is_pdf, StagedUpload, PDF_MIME};

const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "Model API service is unavailable. Please try again later.";
const PROCESSING_FAILED_MESSAGE: &str = "Failed to process document";
const FILE_TOO_LARGE_MESSAGE: &str = "File size exceeds the 10MB limit";

#[derive(Deserialize, ToSchema)]
pub struct SimplifyRequest {
    #[serde(default)]
    pub text: String,
}

/// Turns an upstream failure into the message shown to the client.
fn upstream_message(e: &PortError) -> String {
    match e {
        PortError::ServiceUnavailable(_) => SERVICE_UNAVAILABLE_MESSAGE.to_string(),
        PortError::Classification(message) => message.clone(),
        _ => PROCESSING_FAILED_MESSAGE.to_string(),
    }
}

//=========================================================================================
// Listing and fetching
//=========================================================================================

/// GET /api/documents - All documents of the caller, newest first
#[utoipa::path(
    get,
    path = "/api/documents",
    responses(
        (status = 200, description = "The caller's documents", body = [Document]),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<Document>>, HttpError> {
    let documents = state.documents.list_by_user(user_id).await.map_err(|e| {
        error!("Failed to list documents for {}: {:?}", user_id, e);
        HttpError::internal("Server error")
    })?;
    Ok(Json(documents))
}

/// GET /api/documents/{id} - One document owned by the caller
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "The document", body = Document),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 404, description = "Unknown document or owned by someone else", body = MessageResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<String>,
) -> Result<Json<Document>, HttpError> {
    let document_id =
        Uuid::parse_str(&id).map_err(|_| HttpError::not_found("Document not found"))?;

    let document = state
        .documents
        .get_by_id_for_user(document_id, user_id)
        .await
        .map_err(|e| {
            error!("Failed to load document {}: {:?}", document_id, e);
            HttpError::internal("Server error")
        })?
        .ok_or_else(|| HttpError::not_found("Document not found"))?;
    Ok(Json(document))
}

//=========================================================================================
// Upload pipeline
//=========================================================================================

/// The step of the upload pipeline that failed after the record was created.
#[derive(Debug)]
enum UploadFailure {
    ReadArtifact(std::io::Error),
    Classify(PortError),
    /// The record left `processing` before the analysis could be applied.
    Transition(DocumentStatus),
    Persist(PortError),
}

impl UploadFailure {
    fn user_message(&self) -> String {
        match self {
            UploadFailure::Classify(e) => upstream_message(e),
            UploadFailure::ReadArtifact(_)
            | UploadFailure::Transition(_)
            | UploadFailure::Persist(_) => PROCESSING_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Settles a created record as `error` if the upload is abandoned before
/// `process_staged` finishes, e.g. when the client disconnects mid-analysis.
struct PendingDocument {
    store: Arc<dyn DocumentStore>,
    document: Option<Document>,
}

impl PendingDocument {
    fn new(store: Arc<dyn DocumentStore>, document: &Document) -> Self {
        Self {
            store,
            document: Some(document.clone()),
        }
    }

    fn settle(mut self) {
        self.document = None;
    }
}

impl Drop for PendingDocument {
    fn drop(&mut self) {
        let Some(mut document) = self.document.take() else {
            return;
        };
        if !document.mark_failed() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("Document {} abandoned outside a runtime, status left as processing", document.id);
            return;
        };
        warn!("Upload of document {} abandoned, marking it as error", document.id);
        let store = self.store.clone();
        handle.spawn(async move {
            if let Err(e) = store.update(&document).await {
                warn!("Could not persist error status for {}: {:?}", document.id, e);
            }
        });
    }
}

struct IncomingFile {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

fn multipart_error(e: MultipartError) -> HttpError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HttpError::bad_request(FILE_TOO_LARGE_MESSAGE)
    } else {
        HttpError::bad_request(format!("Invalid upload: {}", e.body_text()))
    }
}

/// Reads the first file part of the form.
async fn read_file_part(multipart: &mut Multipart) -> Result<Option<IncomingFile>, HttpError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(IncomingFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

fn apply_analysis(
    document: &mut Document,
    result: ClassificationResult,
) -> Result<(), UploadFailure> {
    if document.mark_analyzed(result) {
        Ok(())
    } else {
        Err(UploadFailure::Transition(document.status))
    }
}

async fn analyze(
    state: &AppState,
    document: &mut Document,
    staged: &StagedUpload,
) -> Result<(), UploadFailure> {
    let bytes = staged.read().await.map_err(UploadFailure::ReadArtifact)?;
    let result = state
        .classifier
        .classify(bytes, staged.original_name(), PDF_MIME)
        .await
        .map_err(UploadFailure::Classify)?;

    apply_analysis(document, result)?;
    state
        .documents
        .update(document)
        .await
        .map_err(UploadFailure::Persist)
}

/// Creates the record, runs the analysis and settles the final status.
async fn process_staged(
    state: &AppState,
    user_id: Uuid,
    staged: &StagedUpload,
) -> Result<Document, HttpError> {
    let mut document = state
        .documents
        .create(NewDocument {
            user_id,
            file_name: staged.original_name().to_string(),
            status: DocumentStatus::Processing,
        })
        .await
        .map_err(|e| {
            error!("Failed to create document record: {:?}", e);
            HttpError::internal(PROCESSING_FAILED_MESSAGE)
        })?;
    info!("Document {} created, status {}", document.id, document.status);
    let pending = PendingDocument::new(state.documents.clone(), &document);

    let outcome = match analyze(state, &mut document, staged).await {
        Ok(()) => {
            info!("Document {} analyzed as {:?}", document.id, document.classification);
            Ok(document)
        }
        Err(failure) => {
            error!("Processing of document {} failed: {:?}", document.id, failure);
            document.mark_failed();
            if let Err(e) = state.documents.update(&document).await {
                warn!("Could not persist error status for {}: {:?}", document.id, e);
            }
            Err(HttpError::internal(failure.user_message()))
        }
    };
    pending.settle();
    outcome
}

/// POST /api/documents/upload - Upload a PDF and analyze it
#[utoipa::path(
    post,
    path = "/api/documents/upload",
    request_body(content_type = "multipart/form-data", description = "A single PDF file, at most 10MB."),
    responses(
        (status = 200, description = "Document uploaded and analyzed", body = Document),
        (status = 400, description = "No file, not a PDF, or too large", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 500, description = "Analysis failed; the document is stored with status error", body = MessageResponse)
    ),
    security(("bearer" = []))
)]
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Document>, HttpError> {
    // 1. Validate before anything is written
    let mut multipart = multipart?;
    let file = read_file_part(&mut multipart)
        .await?
        .ok_or_else(|| HttpError::bad_request("No file uploaded"))?;
    if !is_pdf(&file.file_name, file.content_type.as_deref()) {
        return Err(HttpError::bad_request("Only PDF files are allowed"));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(HttpError::bad_request(FILE_TOO_LARGE_MESSAGE));
    }

    // 2. Stage the artifact
    let staged = StagedUpload::stage(&state.config.upload_dir, &file.file_name, &file.bytes)
        .await
        .map_err(|e| {
            error!("Failed to stage upload: {}", e);
            HttpError::internal(PROCESSING_FAILED_MESSAGE)
        })?;
    drop(file);

    // 3. Process, then always remove the artifact
    let outcome = process_staged(&state, user_id, &staged).await;
    staged.discard().await;
    outcome.map(Json)
}

//=========================================================================================
// Standalone simplification
//=========================================================================================

/// POST /api/documents/simplify-text - Explain the jargon in a piece of text
#[utoipa::path(
    post,
    path = "/api/documents/simplify-text",
    request_body = SimplifyRequest,
    responses(
        (status = 200, description = "Simplified text and jargon breakdown", body = JargonResult),
        (status = 400, description = "Text is empty", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 500, description = "Model service failure", body = MessageResponse)
    ),
    security(("bearer" = []))
)]
pub async fn simplify_text_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    JsonBody(req): JsonBody<SimplifyRequest>,
) -> Result<Json<JargonResult>, HttpError> {
    if req.text.trim().is_empty() {
        return Err(HttpError::bad_request("Text is required"));
    }

    let result = state.classifier.simplify_jargon(&req.text).await.map_err(|e| {
        error!("Jargon simplification for {} failed: {:?}", user_id, e);
        HttpError::internal(upstream_message(&e))
    })?;
    Ok(Json(result))
}
