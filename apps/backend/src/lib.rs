pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::gateway::{AnalysisGateway, ChatGateway};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub gateway: Arc<dyn AnalysisGateway>,
    pub config: Arc<Config>,
}

/// Build the full router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Entry store
        .route(
            "/api/entries",
            get(routes::entries::list)
                .post(routes::entries::create)
                .patch(routes::entries::update)
                .delete(routes::entries::remove),
        )
        .route("/api/entries/status", post(routes::entries::update_status))
        .route("/api/entries/all", delete(routes::entries::clear))
        .route("/api/entries/export", get(routes::entries::export))
        .route("/api/entries/import", post(routes::entries::import))
        .route("/api/entries/dates", get(routes::entries::dates))
        // Exam
        .route("/api/exam", get(routes::exam::compose_exam))
        .route("/api/exam/print", get(routes::exam::print))
        // Analysis and batch import
        .route("/api/analyze", post(routes::analyze::analyze))
        .route("/api/import/batch", post(routes::import::batch))
        .route("/api/import/retry", post(routes::import::retry))
        .route("/api/import/commit", post(routes::import::commit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    tracing::info!(
        provider = config.ai.provider.as_str(),
        model = %config.ai.model,
        "Initializing analysis gateway..."
    );
    if config.ai.api_key.is_empty() {
        tracing::warn!(
            "No API key for {}; set AI_API_KEY or {}",
            config.ai.provider.as_str(),
            config.ai.provider.key_var()
        );
    }
    let gateway = ChatGateway::new(&config.ai)?;

    let addr = config.bind_addr();
    let state = AppState {
        db: Arc::new(db),
        gateway: Arc::new(gateway),
        config: Arc::new(config),
    };

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
