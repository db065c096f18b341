//! Append-only JSON-lines log of processed readings.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soilsense_core::reading::Reading;
use tokio::{io::AsyncWriteExt as _, sync::Mutex};

/// Where a logged reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
  /// Polled from the telemetry source.
  #[serde(rename = "API")]
  Api,
  /// Posted by a device.
  #[serde(rename = "Direct POST")]
  DirectPost,
}

/// One line of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
  pub timestamp:  DateTime<Utc>,
  #[serde(flatten)]
  pub reading:    Reading,
  pub fertilizer: String,
  pub source:     Source,
}

pub struct SensorLog {
  path:  PathBuf,
  // Serialises appends so concurrent lines never interleave.
  write: Mutex<()>,
}

impl SensorLog {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path:  path.into(),
      write: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path { &self.path }

  /// Append `entry` as one JSON line, creating the file and its parent
  /// directories on first use.
  pub async fn append(&self, entry: &LogEntry) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(entry).map_err(std::io::Error::other)?;
    line.push(b'\n');

    let _guard = self.write.lock().await;
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .await?;
    file.write_all(&line).await?;
    file.flush().await
  }

  /// Append `entry`, logging rather than returning any failure.
  pub async fn record(&self, entry: &LogEntry) {
    if let Err(e) = self.append(entry).await {
      tracing::warn!(path = %self.path.display(), error = %e, "failed to append sensor log");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(fertilizer: &str, source: Source) -> LogEntry {
    LogEntry {
      timestamp: Utc::now(),
      reading: Reading::default(),
      fertilizer: fertilizer.to_string(),
      source,
    }
  }

  #[tokio::test]
  async fn appends_one_line_per_entry() {
    let dir = tempfile::tempdir().unwrap();
    let log = SensorLog::new(dir.path().join("nested/sensor_log.jsonl"));

    log.append(&entry("Urea", Source::Api)).await.unwrap();
    log.append(&entry("DAP", Source::DirectPost)).await.unwrap();

    let raw = std::fs::read_to_string(log.path()).unwrap();
    let lines: Vec<LogEntry> = raw
      .lines()
      .map(|l| serde_json::from_str(l).unwrap())
      .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].fertilizer, "Urea");
    assert_eq!(lines[1].source, Source::DirectPost);
  }

  #[tokio::test]
  async fn entries_are_flat_with_readable_source() {
    let dir = tempfile::tempdir().unwrap();
    let log = SensorLog::new(dir.path().join("sensor_log.jsonl"));
    log.append(&entry("MOP", Source::DirectPost)).await.unwrap();

    let raw = std::fs::read_to_string(log.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(raw.trim()).unwrap();
    assert_eq!(value["source"], "Direct POST");
    assert_eq!(value["soil_type"], 1);
    assert_eq!(value["nitrogen"], 20.0);
  }

  #[tokio::test]
  async fn record_swallows_errors() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened for appending.
    let log = SensorLog::new(dir.path());
    log.record(&entry("Urea", Source::Api)).await;
  }
}
