//! Sponsor Page Host
//!
//! Axum server for the WASM sponsor pages. Payments themselves go straight
//! from the browser to the rescue API; this process only serves files and
//! tells the pages which API deployment to use.

mod handlers;
mod state;

use std::path::Path;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::handlers::{client_config, health_check};
use crate::state::{AppState, ServerConfig};

/// Routes plus the static frontend; unknown paths get `index.html` so the
/// client router can take over
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let frontend = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/config", get(client_config))
        .fallback_service(frontend)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        mode = config.api.mode.as_str(),
        base_url = %config.api.base_url,
        "Sponsor API configured"
    );
    if !config.static_dir.join("index.html").exists() {
        tracing::warn!(dir = %config.static_dir.display(), "No index.html, frontend not built?");
    }

    let app = router(AppState::new(config.api.clone()), &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("sponsor-server running on http://{}", config.bind_addr);
    tracing::info!("  GET  /health      - Health check");
    tracing::info!("  GET  /api/config  - API deployment for the pages");

    axum::serve(listener, app).await?;

    Ok(())
}
