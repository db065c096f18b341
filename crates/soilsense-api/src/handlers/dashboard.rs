//! `GET /`

use axum::{extract::State, response::Html};
use soilsense_core::oracle::FertilizerOracle;

use crate::{AppState, render};

/// Render the cached state. Never polls the telemetry source.
pub async fn page<O>(State(state): State<AppState<O>>) -> Html<String>
where
  O: FertilizerOracle,
{
  let snapshot = state.dashboard.lock().await.snapshot();
  Html(render::dashboard(&snapshot, state.oracle.is_some()))
}
