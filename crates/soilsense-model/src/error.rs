//! Error type for `soilsense-model`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] soilsense_core::Error),

  #[error("i/o error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A dataset row carried a soil or crop name outside the code tables.
  #[error("dataset row {row}: {source}")]
  Row {
    row:    usize,
    #[source]
    source: soilsense_core::Error,
  },

  #[error("dataset is empty")]
  EmptyDataset,

  #[error("invalid test size {0}; expected a fraction strictly between 0 and 1")]
  InvalidTestSize(f64),

  #[error("a random forest needs at least one tree")]
  InvalidTreeCount,

  #[error("splitting {rows} rows with test size {test_size} leaves an empty partition")]
  DegenerateSplit { rows: usize, test_size: f64 },

  #[error("unknown fertilizer label: {0:?}")]
  UnknownLabel(String),

  #[error("unknown class index: {0}")]
  UnknownClass(u32),

  #[error("classifier returned no prediction")]
  EmptyPrediction,

  #[error("classifier error: {0}")]
  Classifier(#[from] smartcore::error::Failed),

  #[error("missing model artifact: {0:?}")]
  MissingArtifact(PathBuf),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
