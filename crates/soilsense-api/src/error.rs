//! Error types and axum `IntoResponse` implementations.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by a dashboard handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error("model not loaded; run `soilsense train` first")]
  ModelUnavailable,

  #[error("prediction failed: {0}")]
  Prediction(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<soilsense_core::Error> for ApiError {
  fn from(e: soilsense_core::Error) -> Self { ApiError::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (
      status,
      Json(json!({ "status": "error", "message": self.to_string() })),
    )
      .into_response()
  }
}

/// An error returned by a telemetry relay handler.
#[derive(Debug, Error)]
pub enum RelayError {
  #[error("Failed to read sensor data")]
  Read(#[source] std::io::Error),

  #[error("Failed to save sensor data")]
  Write(#[source] std::io::Error),

  #[error("Missing required fields: {}", .0.join(", "))]
  MissingFields(Vec<&'static str>),

  #[error("Invalid JSON data")]
  InvalidJson,
}

impl IntoResponse for RelayError {
  fn into_response(self) -> Response {
    let status = match &self {
      RelayError::Read(_) | RelayError::Write(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      RelayError::MissingFields(_) | RelayError::InvalidJson => {
        StatusCode::BAD_REQUEST
      }
    };
    if let RelayError::Read(e) | RelayError::Write(e) = &self {
      tracing::error!(error = %e, "{}", self);
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
