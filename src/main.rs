mod api;
mod bill;
mod bundler;
mod catalog;
mod config;
mod dispatch;
mod domain;
mod errors;
mod normalize;
mod orchestrator;
mod pricing;
mod result;
mod telemetry;

use anyhow::Result;
use config::AppConfig;
use telemetry::init_tracing;
use tracing::{info, warn};

use api::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = AppConfig::load()?;
    let app_state = AppState::new(cfg.clone());

    let app = api::router(app_state);

    let addr = cfg.server.socket_addr()?;
    info!(%addr, "starting bess-offer-engine");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
