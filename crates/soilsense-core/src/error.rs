//! Error types for `soilsense-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown soil type code: {0}")]
  UnknownSoilType(i64),

  #[error("unknown crop type code: {0}")]
  UnknownCropType(i64),

  #[error("unknown soil type name: {0:?}")]
  UnknownSoilName(String),

  #[error("unknown crop type name: {0:?}")]
  UnknownCropName(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
