//! Health check endpoint
//!
//! Reports process liveness plus whether a streamer is currently
//! connected, for monitoring probes and the process supervisor.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::http::AppState;

/// Health check router
pub fn create_health_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    streamer: &'static str,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let streamer = if state.relay.has_streamer() {
        "connected"
    } else {
        "disconnected"
    };
    Json(HealthResponse {
        status: "ok",
        streamer,
    })
}
