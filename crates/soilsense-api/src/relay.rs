//! Store-and-forward relay for field devices.
//!
//! Devices `POST /write_data` with a full reading; the dashboard (or anyone
//! else) reads the last write back from `GET /get_data`. The last write is
//! kept in a single pretty-printed JSON file.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Json, Router,
  body::Bytes,
  extract::{Request, State},
  http::{Method, StatusCode, header},
  middleware::{self, Next},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::error::RelayError;

/// Fields every write must carry.
pub const REQUIRED_FIELDS: [&str; 6] =
  ["moisture", "temperature", "humidity", "nitrogen", "phosphorus", "potassium"];

#[derive(Clone)]
pub struct RelayState {
  path:  Arc<PathBuf>,
  write: Arc<Mutex<()>>,
}

impl RelayState {
  /// Use `path` as the data file, seeding it with an all-zero reading if it
  /// does not exist yet.
  pub async fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
    let path = path.into();
    if !tokio::fs::try_exists(&path).await? {
      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
      }
      let mut initial = Map::new();
      for field in REQUIRED_FIELDS {
        initial.insert(field.to_string(), json!(0));
      }
      initial.insert("timestamp".to_string(), json!(now()));
      write_pretty(&path, &Value::Object(initial)).await?;
      tracing::info!(path = %path.display(), "created relay data file");
    }
    Ok(Self {
      path:  Arc::new(path),
      write: Arc::new(Mutex::new(())),
    })
  }

  pub fn path(&self) -> &Path { &self.path }
}

/// Build the relay [`Router`]. CORS is wide open so browser-based devices
/// and dashboards can reach it.
pub fn relay_router(state: RelayState) -> Router {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE]);

  Router::new()
    .route("/get_data",   get(get_data))
    .route("/write_data", post(write_data))
    .fallback(not_found)
    .layer(cors)
    .layer(middleware::from_fn(preflight_no_content))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /get_data`
async fn get_data(State(state): State<RelayState>) -> Result<Json<Value>, RelayError> {
  let raw = tokio::fs::read(state.path()).await.map_err(RelayError::Read)?;
  let value = serde_json::from_slice(&raw)
    .map_err(|e| RelayError::Read(std::io::Error::other(e)))?;
  Ok(Json(value))
}

/// `POST /write_data`
async fn write_data(
  State(state): State<RelayState>,
  body: Bytes,
) -> Result<Json<Value>, RelayError> {
  let mut object = match serde_json::from_slice(&body) {
    Ok(Value::Object(object)) => object,
    _ => return Err(RelayError::InvalidJson),
  };

  let missing: Vec<&'static str> = REQUIRED_FIELDS
    .into_iter()
    .filter(|field| !object.contains_key(*field))
    .collect();
  if !missing.is_empty() {
    return Err(RelayError::MissingFields(missing));
  }

  object.insert("timestamp".to_string(), json!(now()));
  {
    let _guard = state.write.lock().await;
    write_pretty(state.path(), &Value::Object(object))
      .await
      .map_err(RelayError::Write)?;
  }
  tracing::debug!("stored device reading");

  Ok(Json(json!({ "status": "success", "message": "Data saved successfully" })))
}

/// Answer CORS preflights with 204 rather than the layer's bare 200.
async fn preflight_no_content(req: Request, next: Next) -> Response {
  let preflight = req.method() == Method::OPTIONS;
  let mut resp = next.run(req).await;
  if preflight && resp.status() == StatusCode::OK {
    *resp.status_mut() = StatusCode::NO_CONTENT;
  }
  resp
}

async fn not_found() -> impl IntoResponse {
  (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}

fn now() -> String { Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true) }

async fn write_pretty(path: &Path, value: &Value) -> std::io::Result<()> {
  let bytes = serde_json::to_vec_pretty(value).map_err(std::io::Error::other)?;
  tokio::fs::write(path, bytes).await
}

#[cfg(test)]
mod tests {
  use axum::body::Body;
  use axum::http::Request;
  use tower::ServiceExt as _;

  use super::*;

  async fn call(
    state: &RelayState,
    method: &str,
    uri: &str,
    body: &str,
  ) -> (StatusCode, Value) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = relay_router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn fresh_file_holds_zeros() {
    let dir = tempfile::tempdir().unwrap();
    let state = RelayState::open(dir.path().join("data/sensor_data.json")).await.unwrap();

    let (status, body) = call(&state, "GET", "/get_data", "").await;
    assert_eq!(status, StatusCode::OK);
    for field in REQUIRED_FIELDS {
      assert_eq!(body[field], 0, "{field}");
    }
    assert!(body["timestamp"].is_string());
  }

  #[tokio::test]
  async fn existing_file_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_data.json");
    std::fs::write(&path, r#"{"nitrogen": 9}"#).unwrap();

    let state = RelayState::open(&path).await.unwrap();
    let (_, body) = call(&state, "GET", "/get_data", "").await;
    assert_eq!(body, json!({ "nitrogen": 9 }));
  }

  #[tokio::test]
  async fn write_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let state = RelayState::open(dir.path().join("sensor_data.json")).await.unwrap();

    let reading = json!({
      "moisture": 40.2, "temperature": 26.0, "humidity": 65.0,
      "nitrogen": 30.0, "phosphorus": 14.0, "potassium": 22.0,
      "soil_type": 2,
    });
    let (status, body) = call(&state, "POST", "/write_data", &reading.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success", "message": "Data saved successfully" }));

    let (_, stored) = call(&state, "GET", "/get_data", "").await;
    assert_eq!(stored["moisture"], 40.2);
    assert_eq!(stored["soil_type"], 2);
    assert!(stored["timestamp"].as_str().unwrap().ends_with('Z'));

    let on_disk = std::fs::read_to_string(state.path()).unwrap();
    assert!(on_disk.contains('\n'), "expected pretty-printed JSON");
  }

  #[tokio::test]
  async fn missing_fields_are_listed_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let state = RelayState::open(dir.path().join("sensor_data.json")).await.unwrap();

    let (status, body) = call(
      &state,
      "POST",
      "/write_data",
      r#"{"temperature": 20, "humidity": 50, "nitrogen": 1, "potassium": 2}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing required fields: moisture, phosphorus" }));
  }

  #[tokio::test]
  async fn invalid_json_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = RelayState::open(dir.path().join("sensor_data.json")).await.unwrap();

    for body in ["{oops", "[1, 2, 3]"] {
      let (status, resp) = call(&state, "POST", "/write_data", body).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert_eq!(resp, json!({ "error": "Invalid JSON data" }));
    }
  }

  #[tokio::test]
  async fn unreadable_file_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let state = RelayState::open(dir.path().join("sensor_data.json")).await.unwrap();
    std::fs::remove_file(state.path()).unwrap();

    let (status, body) = call(&state, "GET", "/get_data", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to read sensor data" }));
  }

  #[tokio::test]
  async fn unknown_route_is_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = RelayState::open(dir.path().join("sensor_data.json")).await.unwrap();

    let (status, body) = call(&state, "GET", "/nope", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Route not found" }));
  }

  #[tokio::test]
  async fn preflight_allows_any_origin_with_no_content() {
    let dir = tempfile::tempdir().unwrap();
    let state = RelayState::open(dir.path().join("sensor_data.json")).await.unwrap();

    let req = Request::builder()
      .method("OPTIONS")
      .uri("/write_data")
      .header(header::ORIGIN, "http://device.local")
      .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
      .body(Body::empty())
      .unwrap();
    let resp = relay_router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
  }
}
