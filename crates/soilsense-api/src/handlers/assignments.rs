//! `GET /assignments`

use axum::{Json, extract::State};
use soilsense_core::{assignment::AssignmentTable, oracle::FertilizerOracle};

use crate::AppState;

/// The assignment table keyed by soil code, then crop code.
pub async fn list<O>(State(state): State<AppState<O>>) -> Json<AssignmentTable>
where
  O: FertilizerOracle,
{
  Json(state.dashboard.lock().await.assignments.clone())
}
