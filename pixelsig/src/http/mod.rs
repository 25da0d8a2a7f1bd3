// Module: http
// HTTP surface: WebSocket signaling endpoint, health check, and the
// static player page.

pub mod health;
pub mod websocket;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use pixelsig_core::{Config, Relay};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
    pub config: Arc<Config>,
}

/// Create the HTTP router with all routes
pub fn create_router(relay: Relay, config: Arc<Config>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let serve_dir = ServeDir::new(&config.server.public_dir);

    let state = AppState { relay, config };

    Router::new()
        .route("/ws", get(websocket::ws_handler))
        .merge(health::create_health_router())
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
