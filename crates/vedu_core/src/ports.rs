//! crates/vedu_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    ClassificationResult, Document, JargonResult, ModelServiceHealth, NewDocument, NewUser, User,
    UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("User already exists")]
    DuplicateEmail,
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Classification(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persisted user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up login credentials. `None` when no account uses this email.
    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    /// Fails with [`PortError::DuplicateEmail`] when the email is taken.
    async fn create(&self, user: NewUser) -> PortResult<User>;

    async fn find_by_id(&self, user_id: Uuid) -> PortResult<Option<User>>;
}

/// Persisted document metadata and analysis. Every read is scoped to an owner.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, document: NewDocument) -> PortResult<Document>;

    /// Newest upload first.
    async fn list_by_user(&self, user_id: Uuid) -> PortResult<Vec<Document>>;

    /// Returns `None` both for unknown ids and for documents owned by someone else.
    async fn get_by_id_for_user(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<Document>>;

    /// Persists status and analysis fields of an existing document.
    async fn update(&self, document: &Document) -> PortResult<()>;
}

/// The external document classification and jargon simplification service.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    async fn classify(
        &self,
        file_bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> PortResult<ClassificationResult>;

    async fn simplify_jargon(&self, text: &str) -> PortResult<JargonResult>;

    async fn health(&self) -> PortResult<ModelServiceHealth>;
}
