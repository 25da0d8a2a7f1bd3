//! Server lifecycle management
//!
//! Binds the HTTP listener, serves the signaling router, and shuts
//! down gracefully on SIGINT/SIGTERM. Failure to bind is the only
//! fatal error; everything past startup is handled per connection.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use pixelsig_core::{Config, Relay};

use crate::http::create_router;

pub struct SignalingServer {
    config: Arc<Config>,
    relay: Relay,
}

impl SignalingServer {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let relay = Relay::new(config.webrtc.peer_connection_options.clone());
        Self {
            config: Arc::new(config),
            relay,
        }
    }

    pub async fn run(self) -> Result<()> {
        let address = self.config.http_address();
        let router = create_router(self.relay.clone(), self.config.clone());

        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {address}: {e}"))?;

        info!("HTTP server listening on {address}");
        info!("WebSocket endpoint ready at ws://{address}/ws");
        info!("Waiting for streamer connection...");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server shut down gracefully");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
