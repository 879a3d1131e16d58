pub mod error;
pub mod health;
pub mod sizing;

use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;

/// Shared application state handed to every handler: just the validated
/// config, since the orchestrator is a pure function of (config, series,
/// catalog) and carries no state of its own between requests.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config: Arc::new(config) }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = if state.config.server.enable_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/sizing/runs", post(sizing::run_sizing))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
