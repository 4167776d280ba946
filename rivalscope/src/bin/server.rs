//! Local analysis gateway server

use anyhow::Result;
use clap::Parser;
use scout::api::{create_router, ApiState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Serve sample competitor research over the gateway wire contract
#[derive(Parser, Debug)]
#[command(name = "scout-gateway", version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SCOUT_GATEWAY_PORT", default_value_t = 8080)]
    port: u16,

    /// Artificial latency per research request, in milliseconds
    #[arg(long, default_value_t = 1500)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    info!("Starting scout gateway v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(ApiState {
        delay: Duration::from_millis(args.delay_ms),
    });
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!(delay_ms = args.delay_ms, "Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
