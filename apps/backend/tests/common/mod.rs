//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up the app with a database and a fake gateway
//! - ScriptedGateway, an in-memory analysis gateway
//!
//! # Requirements
//! Tests built with [`TestContext::new`] need PostgreSQL (set DATABASE_URL).
//! [`TestContext::without_database`] only needs the fake gateway.

pub mod fixtures;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use uuid::Uuid;

use cuotiben_backend::config::Config;
use cuotiben_backend::db::Database;
use cuotiben_backend::services::gateway::{AnalysisGateway, GatewayError};
use cuotiben_backend::{app, AppState};
use cuotiben_core::{OcrResult, PoemAnalysis, WordAnalysis};

const UNUSED_DATABASE_URL: &str = "postgres://localhost:1/unused";

/// Gateway answering from memory.
///
/// Words analyse to a fixed pinyin unless they are listed as rate limited
/// or malformed, in which case the whole request fails that way.
#[derive(Default)]
pub struct ScriptedGateway {
    pub calls: Mutex<Vec<Vec<String>>>,
    pub rate_limited: Mutex<HashSet<String>>,
    pub malformed: HashSet<String>,
    pub poem: Option<PoemAnalysis>,
    pub ocr_words: Vec<String>,
}

impl ScriptedGateway {
    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedGateway {
    async fn analyze_words(&self, words: &[String]) -> Result<Vec<WordAnalysis>, GatewayError> {
        self.calls.lock().unwrap().push(words.to_vec());

        if words.iter().any(|w| self.rate_limited.lock().unwrap().contains(w)) {
            return Err(GatewayError::RateLimited("quota exceeded".to_string()));
        }
        if words.iter().any(|w| self.malformed.contains(w)) {
            return Err(GatewayError::Malformed("expected value".to_string()));
        }

        Ok(words.iter().map(|w| fixtures::word_analysis(w)).collect())
    }

    async fn analyze_poem(&self, _text: &str) -> Result<PoemAnalysis, GatewayError> {
        self.poem.clone().ok_or(GatewayError::EmptyOutput)
    }

    async fn recognize_words(&self, _image: &str) -> Result<OcrResult, GatewayError> {
        if self.ocr_words.is_empty() {
            return Err(GatewayError::Unsupported("deepseek cannot read images".to_string()));
        }
        Ok(OcrResult {
            words: self.ocr_words.clone(),
        })
    }
}

/// Test context holding the router and its dependencies.
pub struct TestContext {
    pub db: Arc<Database>,
    pub gateway: Arc<ScriptedGateway>,
    app: Router,
}

impl TestContext {
    /// Create a test context backed by a real database.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self::build(db, &database_url, ScriptedGateway::default())
    }

    /// Create a test context whose database is never reached.
    ///
    /// Use this for routes that only talk to the gateway.
    pub fn without_database(gateway: ScriptedGateway) -> Self {
        let db = Database::connect_lazy(UNUSED_DATABASE_URL).expect("Failed to create lazy pool");
        Self::build(db, UNUSED_DATABASE_URL, gateway)
    }

    fn build(db: Database, database_url: &str, gateway: ScriptedGateway) -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(database_url.to_string()),
            "BATCH_CHUNK_DELAY_MS" => Some("0".to_string()),
            _ => None,
        })
        .expect("Failed to build test config");

        let db = Arc::new(db);
        let gateway = Arc::new(gateway);

        let state = AppState {
            db: db.clone(),
            gateway: gateway.clone(),
            config: Arc::new(config),
        };

        Self {
            db,
            gateway,
            app: app(state),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Remove entries created by a test.
    ///
    /// Tests share one database, so they clean up by id rather than
    /// clearing the table.
    pub async fn cleanup_entries(&self, ids: &[&str]) {
        for id in ids {
            if let Ok(id) = Uuid::parse_str(id) {
                let _ = self.db.delete_entry(id).await;
            }
        }
    }
}
