//! Sensor readings and partial updates.
//!
//! A [`Reading`] is the last-known state of the field sensors. It is
//! overwritten in place; [`ReadingPatch`] carries whatever subset of fields a
//! device or telemetry source actually reported.

use serde::{Deserialize, Serialize};

use crate::codes::{CropType, SoilType};

/// The last-known sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
  /// °C
  pub temperature: f64,
  /// Relative humidity, %.
  pub humidity:    f64,
  /// Soil moisture, %.
  pub moisture:    f64,
  /// mg/kg
  pub nitrogen:    f64,
  /// mg/kg
  pub phosphorus:  f64,
  /// mg/kg
  pub potassium:   f64,
  pub soil_type:   SoilType,
  pub crop_type:   CropType,
}

impl Default for Reading {
  fn default() -> Self {
    Self {
      temperature: 25.0,
      humidity:    60.0,
      moisture:    35.0,
      nitrogen:    20.0,
      phosphorus:  15.0,
      potassium:   25.0,
      soil_type:   SoilType::Loamy,
      crop_type:   CropType::Maize,
    }
  }
}

impl Reading {
  /// Overwrite the fields present in `patch`; absent fields are kept.
  pub fn apply(&mut self, patch: &ReadingPatch) {
    let ReadingPatch {
      temperature,
      humidity,
      moisture,
      nitrogen,
      phosphorus,
      potassium,
      soil_type,
      crop_type,
    } = *patch;

    if let Some(v) = temperature {
      self.temperature = v;
    }
    if let Some(v) = humidity {
      self.humidity = v;
    }
    if let Some(v) = moisture {
      self.moisture = v;
    }
    if let Some(v) = nitrogen {
      self.nitrogen = v;
    }
    if let Some(v) = phosphorus {
      self.phosphorus = v;
    }
    if let Some(v) = potassium {
      self.potassium = v;
    }
    if let Some(v) = soil_type {
      self.soil_type = v;
    }
    if let Some(v) = crop_type {
      self.crop_type = v;
    }
  }
}

/// A partial reading. Every field is optional on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub humidity:    Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub moisture:    Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub nitrogen:    Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phosphorus:  Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub potassium:   Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub soil_type:   Option<SoilType>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub crop_type:   Option<CropType>,
}

impl ReadingPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}
