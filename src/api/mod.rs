//! REST API over the warehouse.
//!
//! ```text
//! GET /health
//! GET /api/v1/disciplines
//! GET /api/v1/schools
//! GET /api/v1/programs?school_id=&discipline_id=&search=&offset=&limit=
//! GET /api/v1/programs/{program_id}
//! GET /api/v1/analytics/overview
//! GET /api/v1/analytics/counts/disciplines
//! GET /api/v1/analytics/counts/schools
//! ```

pub mod error;
pub mod routes;

use crate::domain::ports::Warehouse;
use crate::utils::error::Result;
use crate::utils::shutdown::shutdown_signal;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub warehouse: Arc<dyn Warehouse>,
}

impl AppState {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

pub fn router(state: AppState) -> Router {
    let v1 = routes::programs::router().nest("/analytics", routes::analytics::router());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Ensures the schema, then serves until a shutdown signal arrives.
pub async fn serve(bind: &str, warehouse: Arc<dyn Warehouse>) -> Result<()> {
    warehouse.ensure_schema().await?;

    let listener = TcpListener::bind(bind).await?;
    tracing::info!("🌐 CaRMS Program Explorer API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(warehouse)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API stopped");
    Ok(())
}
