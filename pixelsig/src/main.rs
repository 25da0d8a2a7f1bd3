mod http;
mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pixelsig_core::config::load_config;
use pixelsig_core::logging;

use server::SignalingServer;

#[derive(Parser, Debug)]
#[command(name = "pixelsig")]
#[command(about = "WebRTC signaling relay for pixel streaming", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(long, env = "PIXELSIG_CONFIG_PATH")]
    config: Option<String>,

    /// HTTP listen port (overrides config)
    #[arg(long, env = "PIXELSIG_HTTP_PORT")]
    http_port: Option<u16>,

    /// Verbose logging (forces debug level)
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(port) = args.http_port {
        config.server.http_port = port;
    }
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    logging::init_logging(&config.logging)?;
    info!("Pixelsig signaling server starting...");
    info!("HTTP address: {}", config.http_address());

    SignalingServer::new(config).run().await
}
