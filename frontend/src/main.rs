// main.rs
//
// Terminal dashboard: one status line per second while telemetry flows,
// operator commands from stdin.

use clap::Parser;
use gcs_frontend::dashboard::{HELP, OperatorInput, parse_operator_input, render_status_line};
use gcs_frontend::{ClientConfig, TelemetryClient};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STATUS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "gcs_frontend", about = "Ground-control telemetry dashboard")]
struct Args {
    /// Backend WebSocket URL (overrides config file and GCS_WS_URL)
    #[arg(long)]
    url: Option<String>,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = ClientConfig::load()?;
    if let Some(url) = args.url.as_deref() {
        config = config.with_url(url)?;
    }
    if args.save {
        let path = ClientConfig::default_path();
        config.save_to(&path)?;
        info!("saved config to {path:?}");
    }

    info!("dashboard starting, backend {}", config.url);
    let client = TelemetryClient::new(config);
    client.connect();

    let mut revisions = client.subscribe();
    let mut ticker = tokio::time::interval(STATUS_INTERVAL);
    let mut dirty = true;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!("{HELP}");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if dirty {
                    println!("{}", render_status_line(&client.view()));
                    dirty = false;
                }
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                dirty = true;
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_operator_input(&line) {
                    Some(OperatorInput::Send(cmd)) => client.send_command(cmd),
                    Some(OperatorInput::Help) => println!("{HELP}"),
                    Some(OperatorInput::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => println!("unknown command {:?}; {HELP}", line.trim()),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("stdin: {e}");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received");
                break;
            }
        }
    }

    client.shutdown().await;
    Ok(())
}
