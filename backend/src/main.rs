// main.rs
//
// Mock vehicle backend: serves the telemetry WebSocket the dashboard talks to.

mod network_sim;
mod state;
mod telemetry_task;
mod vehicle_sim;
mod web;

use crate::network_sim::network_task;
use crate::state::AppState;
use crate::telemetry_task::telemetry_task;
use crate::vehicle_sim::vehicle_task;
use axum::Router;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gcs_backend", about = "Mock vehicle telemetry backend")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// WebSocket port
    #[arg(long, default_value_t = 8765)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // --- Shared state ---
    let state = AppState::new();

    // --- Background tasks ---
    let _vt = tokio::spawn(vehicle_task(state.clone()));
    let _nt = tokio::spawn(network_task(state.clone()));
    let _tt = tokio::spawn(telemetry_task(state.clone()));

    // --- Webserver ---
    let app: Router = web::router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("mock backend listening on ws://{addr}");
    info!("features: MAVLink (mock), ZeroTier VPN (mock), network simulation");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
