//! SoilSense telemetry relay.
//!
//! Devices write their latest reading with `POST /write_data`; the dashboard
//! polls it back with `GET /get_data`.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use soilsense_api::relay::{RelayState, relay_router};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "SoilSense telemetry relay")]
struct Cli {
  #[arg(long, default_value = "0.0.0.0", env = "HOST")]
  host: String,

  #[arg(short, long, default_value_t = 3000, env = "PORT")]
  port: u16,

  /// JSON file holding the last reading written by a device.
  #[arg(short, long, default_value = "sensor_data.json", env = "RELAY_DATA")]
  data: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let state = RelayState::open(&cli.data)
    .await
    .with_context(|| format!("failed to prepare data file {:?}", cli.data))?;

  let address = format!("{}:{}", cli.host, cli.port);
  tracing::info!("Relay listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, relay_router(state))
    .await
    .context("relay error")?;

  Ok(())
}
