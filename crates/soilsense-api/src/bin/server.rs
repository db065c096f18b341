//! SoilSense dashboard server.
//!
//! Reads `soilsense.toml` (or the path given with `--config`) layered under
//! `SOILSENSE_*` environment variables, loads the trained model bundle if
//! one exists, and serves the dashboard over HTTP.
//!
//! ```text
//! SOILSENSE_PORT=8080 SOILSENSE_TELEMETRY__KIND=relay \
//!   SOILSENSE_TELEMETRY__URL=http://localhost:3000/get_data server
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use soilsense_api::{
  AppState, Dashboard, ServerConfig, sensor_log::SensorLog,
  telemetry::TelemetrySource,
};
use soilsense_model::ForestOracle;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "SoilSense dashboard server")]
struct Cli {
  /// Path to the TOML configuration file. Missing is fine.
  #[arg(short, long, default_value = "soilsense.toml", env = "SOILSENSE_CONFIG")]
  config: PathBuf,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("SOILSENSE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // A missing model is not fatal; recommendation routes answer 503 until one
  // is trained and the server restarted.
  let oracle = match ForestOracle::load(&server_cfg.models_dir) {
    Ok(oracle) => Some(oracle),
    Err(e) => {
      tracing::warn!(
        models_dir = %server_cfg.models_dir.display(),
        error = %e,
        "model not loaded; run `soilsense train` first"
      );
      None
    }
  };

  let telemetry =
    TelemetrySource::from_config(&server_cfg.telemetry, server_cfg.fetch_timeout())
      .context("failed to build telemetry client")?;

  // Seed the reading from the telemetry source so the first page is current.
  let mut dashboard = Dashboard::default();
  match telemetry.fetch().await {
    Ok(Some(frame)) => {
      dashboard.reading.apply(&frame.patch);
      if let Some(at) = frame.observed_at {
        dashboard.timestamp = at;
      }
      tracing::info!(source = telemetry.kind(), "fetched initial reading");
    }
    Ok(None) => {}
    Err(e) => {
      tracing::warn!(source = telemetry.kind(), error = %e, "initial telemetry fetch failed");
    }
  }

  let state = AppState::with_dashboard(
    oracle,
    telemetry,
    SensorLog::new(&server_cfg.sensor_log),
    dashboard,
  );
  let app = soilsense_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
