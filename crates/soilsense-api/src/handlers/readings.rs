//! Handlers that change the reading and produce a recommendation.
//!
//! Each handler takes the dashboard lock once and holds it across apply,
//! predict, resolve and update. Telemetry polling and sensor-log writes
//! happen outside the lock.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soilsense_core::{
  codes::{CropType, SoilType},
  oracle::FertilizerOracle,
  reading::{Reading, ReadingPatch},
};

use crate::{
  AppState, Dashboard,
  error::ApiError,
  sensor_log::{LogEntry, Source},
};

// ─── Response bodies ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReadingResponse {
  pub status:                 &'static str,
  pub data:                   Reading,
  pub recommended_fertilizer: String,
  pub timestamp:              DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub warning:                Option<String>,
}

impl ReadingResponse {
  fn from_dashboard(dashboard: &Dashboard, warning: Option<String>) -> Self {
    Self {
      status: "success",
      data: dashboard.reading,
      recommended_fertilizer: dashboard.recommended_fertilizer.clone(),
      timestamp: dashboard.timestamp,
      warning,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
  pub status:                 &'static str,
  pub recommended_fertilizer: String,
}

// ─── Sensor data ──────────────────────────────────────────────────────────────

/// `GET /sensor-data`: poll the telemetry source, then recommend.
///
/// A disabled or failing source is not an error: the cached state comes
/// back with a `warning` and nothing is logged.
pub async fn poll<O>(
  State(state): State<AppState<O>>,
) -> Result<Json<ReadingResponse>, ApiError>
where
  O: FertilizerOracle,
{
  let frame = match state.telemetry.fetch().await {
    Ok(Some(frame)) => frame,
    Ok(None) => {
      return Ok(cached(&state, "Using cached data. No telemetry source is configured.").await);
    }
    Err(e) => {
      tracing::warn!(source = state.telemetry.kind(), error = %e, "telemetry poll failed");
      return Ok(
        cached(&state, "Using cached data. Could not fetch new data from the telemetry source.")
          .await,
      );
    }
  };

  let at = frame.observed_at.unwrap_or_else(Utc::now);
  update(&state, Source::Api, at, |reading| reading.apply(&frame.patch)).await
}

/// `POST /sensor-data`: apply a device-reported partial reading.
pub async fn ingest<O>(
  State(state): State<AppState<O>>,
  payload: Result<Json<ReadingPatch>, JsonRejection>,
) -> Result<Json<ReadingResponse>, ApiError>
where
  O: FertilizerOracle,
{
  let Json(patch) = payload?;
  update(&state, Source::DirectPost, Utc::now(), |reading| reading.apply(&patch)).await
}

async fn cached<O>(state: &AppState<O>, warning: &str) -> Json<ReadingResponse> {
  let dashboard = state.dashboard.lock().await;
  Json(ReadingResponse::from_dashboard(&dashboard, Some(warning.to_string())))
}

async fn update<O>(
  state: &AppState<O>,
  source: Source,
  at: DateTime<Utc>,
  change: impl FnOnce(&mut Reading),
) -> Result<Json<ReadingResponse>, ApiError>
where
  O: FertilizerOracle,
{
  let (response, entry) = {
    let mut dashboard = state.dashboard.lock().await;
    change(&mut dashboard.reading);
    dashboard.timestamp = at;
    let fertilizer = dashboard.recommend(state.oracle.as_deref())?;
    tracing::info!(
      soil = %dashboard.reading.soil_type,
      crop = %dashboard.reading.crop_type,
      fertilizer = %fertilizer,
      ?source,
      "recommended"
    );
    let entry = LogEntry {
      timestamp: at,
      reading: dashboard.reading,
      fertilizer,
      source,
    };
    (ReadingResponse::from_dashboard(&dashboard, None), entry)
  };

  state.log.record(&entry).await;
  Ok(Json(response))
}

// ─── Soil and crop selection ──────────────────────────────────────────────────

/// A code as sent by the dashboard selectors: a number, a numeric string, or
/// a name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Code {
  Number(i64),
  Text(String),
}

impl Code {
  fn soil(&self) -> soilsense_core::Result<SoilType> {
    match self {
      Code::Number(n) => SoilType::from_code(*n),
      Code::Text(s) => match s.trim().parse::<i64>() {
        Ok(n) => SoilType::from_code(n),
        Err(_) => SoilType::from_name(s),
      },
    }
  }

  fn crop(&self) -> soilsense_core::Result<CropType> {
    match self {
      Code::Number(n) => CropType::from_code(*n),
      Code::Text(s) => match s.trim().parse::<i64>() {
        Ok(n) => CropType::from_code(n),
        Err(_) => CropType::from_name(s),
      },
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct CropBody {
  pub crop_type: Code,
}

#[derive(Debug, Deserialize)]
pub struct SoilBody {
  pub soil_type: Code,
}

/// `POST /update-crop`
pub async fn update_crop<O>(
  State(state): State<AppState<O>>,
  payload: Result<Json<CropBody>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, ApiError>
where
  O: FertilizerOracle,
{
  let Json(body) = payload?;
  let crop = body.crop_type.crop()?;
  select(&state, |reading| reading.crop_type = crop).await
}

/// `POST /update-soil`
pub async fn update_soil<O>(
  State(state): State<AppState<O>>,
  payload: Result<Json<SoilBody>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, ApiError>
where
  O: FertilizerOracle,
{
  let Json(body) = payload?;
  let soil = body.soil_type.soil()?;
  select(&state, |reading| reading.soil_type = soil).await
}

async fn select<O>(
  state: &AppState<O>,
  change: impl FnOnce(&mut Reading),
) -> Result<Json<RecommendationResponse>, ApiError>
where
  O: FertilizerOracle,
{
  let mut dashboard = state.dashboard.lock().await;
  change(&mut dashboard.reading);
  let fertilizer = dashboard.recommend(state.oracle.as_deref())?;
  Ok(Json(RecommendationResponse {
    status:                 "success",
    recommended_fertilizer: fertilizer,
  }))
}
