//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `UserStore` and `DocumentStore` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use vedu_core::domain::{
    Document, DocumentStatus, ImportantDate, JargonAnalysis, NewDocument, NewUser, User,
    UserCredentials,
};
use vedu_core::ports::{DocumentStore, PortError, PortResult, UserStore};

const DOCUMENT_COLUMNS: &str = "id, user_id, file_name, upload_date, status, classification, \
     confidence, key_terms, summary, important_dates, parties_involved, jargon_analysis";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    user_id: Uuid,
    file_name: String,
    upload_date: DateTime<Utc>,
    status: String,
    classification: Option<String>,
    confidence: Option<f64>,
    key_terms: Vec<String>,
    summary: String,
    important_dates: Json<Vec<ImportantDate>>,
    parties_involved: Vec<String>,
    jargon_analysis: Option<Json<JargonAnalysis>>,
}
impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        let status = self
            .status
            .parse::<DocumentStatus>()
            .map_err(PortError::Unexpected)?;
        Ok(Document {
            id: self.id,
            user_id: self.user_id,
            file_name: self.file_name,
            upload_date: self.upload_date,
            status,
            classification: self.classification,
            confidence: self.confidence,
            key_terms: self.key_terms,
            summary: self.summary,
            important_dates: self.important_dates.0,
            parties_involved: self.parties_involved,
            jargon_analysis: self.jargon_analysis.map(|j| j.0),
        })
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(CredentialsRecord::to_domain))
    }

    async fn create(&self, user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, first_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, first_name, last_name, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => PortError::DuplicateEmail,
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn find_by_id(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, first_name, last_name, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn create(&self, document: NewDocument) -> PortResult<Document> {
        let query = format!(
            "INSERT INTO documents (id, user_id, file_name, status) VALUES ($1, $2, $3, $4) \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, DocumentRecord>(&query)
            .bind(Uuid::new_v4())
            .bind(document.user_id)
            .bind(&document.file_name)
            .bind(document.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        record.to_domain()
    }

    async fn list_by_user(&self, user_id: Uuid) -> PortResult<Vec<Document>> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = $1 ORDER BY upload_date DESC"
        );
        let records = sqlx::query_as::<_, DocumentRecord>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(DocumentRecord::to_domain).collect()
    }

    async fn get_by_id_for_user(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<Document>> {
        let query =
            format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND user_id = $2");
        let record = sqlx::query_as::<_, DocumentRecord>(&query)
            .bind(document_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        record.map(DocumentRecord::to_domain).transpose()
    }

    async fn update(&self, document: &Document) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET status = $1, classification = $2, confidence = $3, \
             key_terms = $4, summary = $5, important_dates = $6, parties_involved = $7, \
             jargon_analysis = $8 \
             WHERE id = $9 AND user_id = $10",
        )
        .bind(document.status.as_str())
        .bind(&document.classification)
        .bind(document.confidence)
        .bind(&document.key_terms)
        .bind(&document.summary)
        .bind(Json(&document.important_dates))
        .bind(&document.parties_involved)
        .bind(document.jargon_analysis.as_ref().map(Json))
        .bind(document.id)
        .bind(document.user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Document {} not found", document.id)));
        }
        Ok(())
    }
}
