//! Polling clients for the configured telemetry source.
//!
//! Each poll yields a [`TelemetryFrame`]: a partial reading plus, when the
//! source reports one, the time the sample was taken.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use soilsense_core::{codes::SoilType, reading::ReadingPatch};
use thiserror::Error;

use crate::TelemetryConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("telemetry source answered {0}")]
  Status(StatusCode),
}

/// One poll result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
  pub patch:       ReadingPatch,
  pub observed_at: Option<DateTime<Utc>>,
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// The configured source of polled readings.
#[derive(Debug, Clone, Default)]
pub enum TelemetrySource {
  #[default]
  Disabled,
  /// A relay returning the last device write as flat JSON.
  Relay { client: Client, url: String },
  /// The `feeds/last.json` endpoint of a ThingSpeak channel.
  ThingSpeak {
    client:       Client,
    url:          String,
    read_api_key: String,
  },
}

impl TelemetrySource {
  pub fn from_config(
    config: &TelemetryConfig,
    timeout: Duration,
  ) -> Result<Self, TelemetryError> {
    let client = || Client::builder().timeout(timeout).build();
    Ok(match config {
      TelemetryConfig::Disabled => Self::Disabled,
      TelemetryConfig::Relay { url } => Self::Relay {
        client: client()?,
        url:    url.clone(),
      },
      TelemetryConfig::ThingSpeak {
        channel_id,
        read_api_key,
        base_url,
      } => Self::ThingSpeak {
        client:       client()?,
        url:          format!(
          "{}/channels/{channel_id}/feeds/last.json",
          base_url.trim_end_matches('/')
        ),
        read_api_key: read_api_key.clone(),
      },
    })
  }

  /// Short name for logs.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Disabled => "disabled",
      Self::Relay { .. } => "relay",
      Self::ThingSpeak { .. } => "thingspeak",
    }
  }

  /// Poll once. `Ok(None)` means the source is disabled.
  pub async fn fetch(&self) -> Result<Option<TelemetryFrame>, TelemetryError> {
    match self {
      Self::Disabled => Ok(None),
      Self::Relay { client, url } => {
        let resp = client.get(url).send().await?;
        if !resp.status().is_success() {
          return Err(TelemetryError::Status(resp.status()));
        }
        let payload: RelayPayload = resp.json().await?;
        Ok(Some(payload.into_frame()))
      }
      Self::ThingSpeak {
        client,
        url,
        read_api_key,
      } => {
        let resp = client
          .get(url)
          .query(&[("api_key", read_api_key)])
          .send()
          .await?;
        if !resp.status().is_success() {
          return Err(TelemetryError::Status(resp.status()));
        }
        let feed: ThingSpeakFeed = resp.json().await?;
        Ok(Some(feed.into_frame()))
      }
    }
  }
}

// ─── Relay payload ───────────────────────────────────────────────────────────

/// Body of the relay's `GET /get_data`.
///
/// The relay stores whatever JSON a device sent, so every field is decoded
/// leniently: numbers and numeric strings count, anything else is skipped on
/// its own without failing the whole poll.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RelayPayload {
  temperature: Option<Value>,
  humidity:    Option<Value>,
  moisture:    Option<Value>,
  nitrogen:    Option<Value>,
  phosphorus:  Option<Value>,
  potassium:   Option<Value>,
  soil_type:   Option<Value>,
  timestamp:   Option<Value>,
}

impl RelayPayload {
  pub(crate) fn into_frame(self) -> TelemetryFrame {
    let soil_type = numeric(self.soil_type.as_ref())
      .filter(|code| code.fract() == 0.0)
      .and_then(|code| {
        SoilType::from_code(code as i64)
          .inspect_err(|e| tracing::warn!(error = %e, "ignoring relay soil type"))
          .ok()
      });
    TelemetryFrame {
      patch:       ReadingPatch {
        temperature: numeric(self.temperature.as_ref()),
        humidity: numeric(self.humidity.as_ref()),
        moisture: numeric(self.moisture.as_ref()),
        nitrogen: numeric(self.nitrogen.as_ref()),
        phosphorus: numeric(self.phosphorus.as_ref()),
        potassium: numeric(self.potassium.as_ref()),
        soil_type,
        crop_type: None,
      },
      observed_at: self
        .timestamp
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_timestamp),
    }
  }
}

// ─── ThingSpeak feed ─────────────────────────────────────────────────────────

/// One entry of a ThingSpeak channel feed.
///
/// Channel layout: field1 humidity, field2 temperature, field3 moisture,
/// field4 nitrogen, field5 phosphorus, field6 potassium.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ThingSpeakFeed {
  created_at: Option<String>,
  field1:     Option<Value>,
  field2:     Option<Value>,
  field3:     Option<Value>,
  field4:     Option<Value>,
  field5:     Option<Value>,
  field6:     Option<Value>,
}

impl ThingSpeakFeed {
  pub(crate) fn into_frame(self) -> TelemetryFrame {
    TelemetryFrame {
      patch:       ReadingPatch {
        humidity: channel_value(self.field1.as_ref()),
        temperature: channel_value(self.field2.as_ref()),
        moisture: channel_value(self.field3.as_ref()),
        nitrogen: channel_value(self.field4.as_ref()),
        phosphorus: channel_value(self.field5.as_ref()),
        potassium: channel_value(self.field6.as_ref()),
        ..ReadingPatch::default()
      },
      observed_at: self.created_at.as_deref().and_then(parse_timestamp),
    }
  }
}

/// A finite number, given either as a JSON number or a numeric string.
fn numeric(value: Option<&Value>) -> Option<f64> {
  let number = match value? {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }?;
  number.is_finite().then_some(number)
}

/// A channel field counts only if it parses to a finite, non-zero number;
/// anything else keeps the previous reading.
fn channel_value(value: Option<&Value>) -> Option<f64> {
  numeric(value).filter(|&number| number != 0.0)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  #[test]
  fn thingspeak_fields_map_to_reading() {
    let feed: ThingSpeakFeed = serde_json::from_value(json!({
      "created_at": "2025-03-01T08:30:00Z",
      "entry_id": 17,
      "field1": "55.5",
      "field2": "24.1",
      "field3": "31",
      "field4": "18",
      "field5": "9.5",
      "field6": "12",
    }))
    .unwrap();

    let frame = feed.into_frame();
    assert_eq!(frame.patch.humidity, Some(55.5));
    assert_eq!(frame.patch.temperature, Some(24.1));
    assert_eq!(frame.patch.moisture, Some(31.0));
    assert_eq!(frame.patch.nitrogen, Some(18.0));
    assert_eq!(frame.patch.phosphorus, Some(9.5));
    assert_eq!(frame.patch.potassium, Some(12.0));
    assert_eq!(
      frame.observed_at,
      Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap())
    );
  }

  #[test]
  fn thingspeak_zero_or_missing_fields_are_skipped() {
    let feed: ThingSpeakFeed = serde_json::from_value(json!({
      "field1": "0",
      "field2": null,
      "field3": "n/a",
      "field4": 40,
    }))
    .unwrap();

    let frame = feed.into_frame();
    assert_eq!(frame.patch.humidity, None);
    assert_eq!(frame.patch.temperature, None);
    assert_eq!(frame.patch.moisture, None);
    assert_eq!(frame.patch.nitrogen, Some(40.0));
    assert_eq!(frame.observed_at, None);
  }

  #[test]
  fn relay_payload_drops_invalid_soil_code() {
    let payload: RelayPayload = serde_json::from_value(json!({
      "temperature": 21.0,
      "soil_type": 9,
      "timestamp": "2025-03-01T08:30:00.000Z",
    }))
    .unwrap();

    let frame = payload.into_frame();
    assert_eq!(frame.patch.temperature, Some(21.0));
    assert_eq!(frame.patch.soil_type, None);
    assert!(frame.observed_at.is_some());
  }

  #[test]
  fn relay_fields_decode_independently() {
    let payload: RelayPayload = serde_json::from_value(json!({
      "moisture": "41",
      "temperature": 27.5,
      "humidity": "humid",
      "nitrogen": 0,
      "phosphorus": null,
      "potassium": [1, 2],
      "soil_type": "3",
    }))
    .unwrap();

    let frame = payload.into_frame();
    assert_eq!(frame.patch.moisture, Some(41.0));
    assert_eq!(frame.patch.temperature, Some(27.5));
    assert_eq!(frame.patch.humidity, None);
    // Zero is a real relay reading, unlike an empty ThingSpeak channel.
    assert_eq!(frame.patch.nitrogen, Some(0.0));
    assert_eq!(frame.patch.phosphorus, None);
    assert_eq!(frame.patch.potassium, None);
    assert_eq!(frame.patch.soil_type, Some(SoilType::Red));
  }

  /// Serve one ThingSpeak channel on a local port and return its base URL,
  /// with a trailing slash.
  async fn thingspeak_stub() -> String {
    use std::collections::HashMap;

    use axum::{Json, Router, extract::Query, routing::get};

    let app = Router::new().route(
      "/channels/42/feeds/last.json",
      get(|Query(params): Query<HashMap<String, String>>| async move {
        if params.get("api_key").map(String::as_str) != Some("READKEY") {
          return (StatusCode::UNAUTHORIZED, Json(json!(-1)));
        }
        (
          StatusCode::OK,
          Json(json!({
            "created_at": "2025-06-10T14:00:00Z",
            "entry_id": 311,
            "field1": "61.0",
            "field2": "23.4",
            "field3": "0",
            "field4": "28",
            "field5": "11",
            "field6": "19.5",
          })),
        )
      }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
  }

  fn thingspeak(base_url: String, channel_id: &str, read_api_key: &str) -> TelemetrySource {
    TelemetrySource::from_config(
      &TelemetryConfig::ThingSpeak {
        channel_id: channel_id.to_string(),
        read_api_key: read_api_key.to_string(),
        base_url,
      },
      Duration::from_secs(5),
    )
    .unwrap()
  }

  #[tokio::test]
  async fn thingspeak_source_fetches_last_entry() {
    let source = thingspeak(thingspeak_stub().await, "42", "READKEY");
    assert_eq!(source.kind(), "thingspeak");

    let frame = source.fetch().await.unwrap().unwrap();
    assert_eq!(frame.patch.humidity, Some(61.0));
    assert_eq!(frame.patch.temperature, Some(23.4));
    assert_eq!(frame.patch.moisture, None);
    assert_eq!(frame.patch.nitrogen, Some(28.0));
    assert_eq!(frame.patch.phosphorus, Some(11.0));
    assert_eq!(frame.patch.potassium, Some(19.5));
    assert_eq!(frame.patch.soil_type, None);
    assert_eq!(
      frame.observed_at,
      Some(Utc.with_ymd_and_hms(2025, 6, 10, 14, 0, 0).unwrap())
    );
  }

  #[tokio::test]
  async fn thingspeak_rejection_is_status_error() {
    let base_url = thingspeak_stub().await;

    let wrong_key = thingspeak(base_url.clone(), "42", "nope");
    assert!(matches!(
      wrong_key.fetch().await,
      Err(TelemetryError::Status(status)) if status == StatusCode::UNAUTHORIZED
    ));

    let wrong_channel = thingspeak(base_url, "7", "READKEY");
    assert!(matches!(
      wrong_channel.fetch().await,
      Err(TelemetryError::Status(status)) if status == StatusCode::NOT_FOUND
    ));
  }

  #[tokio::test]
  async fn disabled_source_yields_nothing() {
    assert!(TelemetrySource::Disabled.fetch().await.unwrap().is_none());
  }
}
