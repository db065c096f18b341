//! The classifier's input layout.
//!
//! Column order is fixed and shared by training and serving; changing it
//! invalidates every persisted model.

use serde::{Deserialize, Serialize};

use crate::reading::Reading;

pub const FEATURE_COUNT: usize = 8;

/// Column names, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
  "temperature",
  "humidity",
  "moisture",
  "soil_type",
  "crop_type",
  "nitrogen",
  "phosphorus",
  "potassium",
];

/// An ordered 8-element feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
  /// Assemble the vector from a reading. Soil and crop contribute their
  /// integer codes.
  pub fn from_reading(reading: &Reading) -> Self {
    Self([
      reading.temperature,
      reading.humidity,
      reading.moisture,
      f64::from(reading.soil_type.code()),
      f64::from(reading.crop_type.code()),
      reading.nitrogen,
      reading.phosphorus,
      reading.potassium,
    ])
  }

  pub fn as_array(&self) -> &[f64; FEATURE_COUNT] { &self.0 }

  pub fn into_array(self) -> [f64; FEATURE_COUNT] { self.0 }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
  fn from(values: [f64; FEATURE_COUNT]) -> Self { Self(values) }
}
