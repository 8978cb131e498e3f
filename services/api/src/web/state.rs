//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::security::TokenService;
use std::sync::Arc;
use vedu_core::ports::{ClassificationService, DocumentStore, UserStore};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub classifier: Arc<dyn ClassificationService>,
    pub tokens: TokenService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserStore>,
        documents: Arc<dyn DocumentStore>,
        classifier: Arc<dyn ClassificationService>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
        Self {
            users,
            documents,
            classifier,
            tokens,
            config,
        }
    }
}
