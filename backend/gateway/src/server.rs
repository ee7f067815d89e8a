//! HTTP server wiring: shared state, routes and layers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use robowarehouse_store::WarehouseStore;
use robowarehouse_vision::Recognizer;

use crate::inventory;
use crate::scans;
use crate::uploads::uploads_router;
use crate::views::UPLOADS_PREFIX;

pub const SERVICE_NAME: &str = "robowarehouse";

/// Application state shared across routes.
pub struct AppState {
    pub store: Arc<dyn WarehouseStore>,
    pub recognizer: Arc<Recognizer>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// Build the full router. Split out from [`start_server`] so tests can
/// serve it on an ephemeral port.
pub fn build_router(state: Arc<AppState>) -> Router {
    let upload_dir = state.upload_dir.clone();
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/", get(health))
        .route("/scans", get(scans::list_scans).post(scans::create_scan))
        .route("/scans/clear_completed", post(scans::clear_completed))
        .route("/scans/:id/approve", post(scans::approve_scan))
        .route("/inventory", get(inventory::list_inventory))
        .route("/inventory/grouped", get(inventory::inventory_grouped))
        .nest(UPLOADS_PREFIX, uploads_router(upload_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Bind and serve until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Warehouse HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Warehouse HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
