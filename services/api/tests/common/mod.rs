#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_lib::adapters::ModelApiAdapter;
use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use vedu_core::domain::{Document, NewDocument, NewUser, User, UserCredentials};
use vedu_core::ports::{DocumentStore, PortError, PortResult, UserStore};

pub const BOUNDARY: &str = "vedu-test-boundary";

// ─── In-memory store doubles ────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<(User, String)>>,
    pub calls: AtomicUsize,
}

impl InMemoryUsers {
    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Removes a user, simulating an account vanishing behind a live token.
    pub fn remove(&self, user_id: Uuid) {
        self.users.lock().unwrap().retain(|(u, _)| u.id != user_id);
    }
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                id: u.id,
                email: u.email.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn create(&self, new: NewUser) -> PortResult<User> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|(u, _)| u.email == new.email) {
            return Err(PortError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            created_at: Utc::now(),
        };
        users.push((user.clone(), new.password_hash));
        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> PortResult<Option<User>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(u, _)| u.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryDocuments {
    documents: Mutex<HashMap<Uuid, Document>>,
    pub calls: AtomicUsize,
    pub fail_updates: AtomicBool,
}

impl InMemoryDocuments {
    pub fn all(&self) -> Vec<Document> {
        self.documents.lock().unwrap().values().cloned().collect()
    }

    pub fn insert(&self, document: Document) {
        self.documents.lock().unwrap().insert(document.id, document);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocuments {
    async fn create(&self, new: NewDocument) -> PortResult<Document> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let document = Document::new(Uuid::new_v4(), new, Utc::now());
        self.insert(document.clone());
        Ok(document)
    }

    async fn list_by_user(&self, user_id: Uuid) -> PortResult<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut docs: Vec<Document> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(docs)
    }

    async fn get_by_id_for_user(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(&document_id)
            .filter(|d| d.user_id == user_id)
            .cloned())
    }

    async fn update(&self, document: &Document) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("database is down".to_string()));
        }
        let mut docs = self.documents.lock().unwrap();
        match docs.get_mut(&document.id) {
            Some(existing) if existing.user_id == document.user_id => {
                *existing = document.clone();
                Ok(())
            }
            _ => Err(PortError::NotFound(format!("Document {} not found", document.id))),
        }
    }
}

// ─── Test app ───────────────────────────────────────────────────────────

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub users: Arc<InMemoryUsers>,
    pub documents: Arc<InMemoryDocuments>,
    pub upload_dir: TempDir,
}

/// A base URL on which nothing is listening.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

impl TestApp {
    pub fn new(model_api_url: &str) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let config = Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            database_url: "postgres://unused".to_string(),
            jwt_secret: "test-jwt-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
            model_api_url: model_api_url.to_string(),
            frontend_origin: "http://localhost:3000".to_string(),
            upload_dir: upload_dir.path().join("uploads"),
            log_level: tracing::Level::INFO,
        });

        let users = Arc::new(InMemoryUsers::default());
        let documents = Arc::new(InMemoryDocuments::default());
        let classifier = Arc::new(ModelApiAdapter::new(reqwest::Client::new(), model_api_url));
        let state = Arc::new(AppState::new(
            config,
            users.clone(),
            documents.clone(),
            classifier,
        ));

        Self {
            router: build_router(state.clone()),
            state,
            users,
            documents,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    /// Files currently left in the upload directory.
    pub fn staged_files(&self) -> usize {
        match std::fs::read_dir(&self.state.config.upload_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    pub async fn signup(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/api/auth/signup",
            None,
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": email,
                "password": password,
            }),
        ))
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": email, "password": password }),
        ))
        .await
    }

    /// Signs up and logs in, returning the user id and bearer token.
    pub async fn register(&self, email: &str) -> (Uuid, String) {
        let (status, _) = self.signup(email, "hunter22").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(email, "hunter22").await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        let user_id = self.state.tokens.verify(&token).unwrap();
        (user_id, token)
    }
}

// ─── Request builders ───────────────────────────────────────────────────

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// A request with an arbitrary body and content type.
pub fn raw_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    content_type: &str,
    body: &str,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// A multipart upload with a single `file` part.
pub fn upload_request(
    token: &str,
    file_name: &str,
    content_type: &str,
    contents: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    multipart_request(token, body)
}

/// A multipart form that only has a text field.
pub fn form_without_file(token: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    multipart_request(token, body.into_bytes())
}

fn multipart_request(token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/documents/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}
