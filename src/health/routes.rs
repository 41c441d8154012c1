//! HTTP status endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::info;

use super::state::HealthState;

/// GET /health
async fn get_health(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    Json(state.snapshot().report())
}

/// Everything else: 404 with no body.
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Build the health router. Only `GET /health` answers; every other method
/// (HEAD included) and every other path gets an empty 404.
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(get_health).head(not_found).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
}

/// Serve the health router on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: Arc<HealthState>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Health endpoint listening");
    }
    axum::serve(listener, health_routes(state)).await
}
