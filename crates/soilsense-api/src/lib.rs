//! HTTP surface for SoilSense.
//!
//! Two axum routers live here:
//!
//! - [`router`]: the dashboard service. It holds the latest reading and the
//!   per-soil assignment table, polls the configured telemetry source on
//!   demand and serves fertilizer recommendations.
//! - [`relay::relay_router`]: a small store-and-forward endpoint that devices
//!   write to and the dashboard can poll.

pub mod error;
pub mod handlers;
pub mod relay;
pub mod render;
pub mod sensor_log;
pub mod telemetry;

pub use error::{ApiError, RelayError};

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soilsense_core::{
  assignment::AssignmentTable, oracle::FertilizerOracle, reading::Reading,
  recommend::recommend,
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use sensor_log::SensorLog;
use telemetry::TelemetrySource;

/// Shown until the first successful recommendation.
pub const NO_RECOMMENDATION: &str = "No recommendation yet";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `soilsense.toml` and
/// `SOILSENSE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// Directory holding the trained model bundle.
  pub models_dir:         PathBuf,
  /// JSON-lines file every processed reading is appended to.
  pub sensor_log:         PathBuf,
  pub telemetry:          TelemetryConfig,
  pub fetch_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "0.0.0.0".to_string(),
      port:               5000,
      models_dir:         PathBuf::from("models"),
      sensor_log:         PathBuf::from("data/sensor_log.jsonl"),
      telemetry:          TelemetryConfig::default(),
      fetch_timeout_secs: 10,
    }
  }
}

impl ServerConfig {
  pub fn fetch_timeout(&self) -> Duration {
    Duration::from_secs(self.fetch_timeout_secs)
  }
}

/// Where `GET /sensor-data` pulls fresh readings from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryConfig {
  #[default]
  Disabled,
  Relay {
    /// Full URL of the relay's `get_data` endpoint.
    url: String,
  },
  ThingSpeak {
    channel_id:   String,
    read_api_key: String,
    #[serde(default = "default_thingspeak_url")]
    base_url:     String,
  },
}

fn default_thingspeak_url() -> String {
  "https://api.thingspeak.com".to_string()
}

// ─── Dashboard state ─────────────────────────────────────────────────────────

/// Everything a recommendation reads or writes.
///
/// Held behind a single mutex so each lookup, predict, resolve and update
/// sequence runs without interleaving.
#[derive(Debug, Clone)]
pub struct Dashboard {
  pub reading:                Reading,
  pub recommended_fertilizer: String,
  pub timestamp:              DateTime<Utc>,
  pub assignments:            AssignmentTable,
}

impl Default for Dashboard {
  fn default() -> Self {
    Self {
      reading:                Reading::default(),
      recommended_fertilizer: NO_RECOMMENDATION.to_string(),
      timestamp:              Utc::now(),
      assignments:            AssignmentTable::new(),
    }
  }
}

impl Dashboard {
  pub fn snapshot(&self) -> Snapshot {
    Snapshot {
      reading:                self.reading,
      recommended_fertilizer: self.recommended_fertilizer.clone(),
      timestamp:              self.timestamp,
    }
  }

  /// Recommend for the current reading and remember the result.
  pub fn recommend<O>(&mut self, oracle: Option<&O>) -> Result<String, ApiError>
  where
    O: FertilizerOracle + ?Sized,
  {
    let oracle = oracle.ok_or(ApiError::ModelUnavailable)?;
    let label = recommend(oracle, &self.reading, &mut self.assignments)
      .map_err(|e| ApiError::Prediction(Box::new(e)))?;
    self.recommended_fertilizer.clone_from(&label);
    Ok(label)
  }
}

/// A copy of the dashboard state, detached from the lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
  #[serde(flatten)]
  pub reading:                Reading,
  pub recommended_fertilizer: String,
  pub timestamp:              DateTime<Utc>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all dashboard handlers.
pub struct AppState<O> {
  /// `None` when no model bundle could be loaded.
  pub oracle:    Option<Arc<O>>,
  pub dashboard: Arc<Mutex<Dashboard>>,
  pub telemetry: Arc<TelemetrySource>,
  pub log:       Arc<SensorLog>,
}

// Derived `Clone` would require `O: Clone`.
impl<O> Clone for AppState<O> {
  fn clone(&self) -> Self {
    Self {
      oracle:    self.oracle.clone(),
      dashboard: self.dashboard.clone(),
      telemetry: self.telemetry.clone(),
      log:       self.log.clone(),
    }
  }
}

impl<O> AppState<O> {
  pub fn new(oracle: Option<O>, telemetry: TelemetrySource, log: SensorLog) -> Self {
    Self::with_dashboard(oracle, telemetry, log, Dashboard::default())
  }

  pub fn with_dashboard(
    oracle: Option<O>,
    telemetry: TelemetrySource,
    log: SensorLog,
    dashboard: Dashboard,
  ) -> Self {
    Self {
      oracle:    oracle.map(Arc::new),
      dashboard: Arc::new(Mutex::new(dashboard)),
      telemetry: Arc::new(telemetry),
      log:       Arc::new(log),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the dashboard [`Router`].
pub fn router<O>(state: AppState<O>) -> Router
where
  O: FertilizerOracle + 'static,
{
  use handlers::{assignments, dashboard, readings};

  Router::new()
    .route("/",             get(dashboard::page::<O>))
    .route("/sensor-data",  get(readings::poll::<O>).post(readings::ingest::<O>))
    .route("/update-crop",  post(readings::update_crop::<O>))
    .route("/update-soil",  post(readings::update_soil::<O>))
    .route("/assignments",  get(assignments::list::<O>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
