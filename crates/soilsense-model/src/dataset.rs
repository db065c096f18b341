//! CSV training dataset.
//!
//! Expected headers (surrounding whitespace is ignored):
//! `Temparature`, `Humidity`, `Moisture`, `Soil Type`, `Crop Type`,
//! `Nitrogen`, `Potassium`, `Phosphorous`, `Fertilizer Name`.
//! `Temperature` and `Phosphorus` are accepted as spellings too.

use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use soilsense_core::{
  codes::{CropType, SoilType},
  features::FeatureVector,
  reading::Reading,
};

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct Record {
  #[serde(rename = "Temparature", alias = "Temperature")]
  temperature: f64,
  #[serde(rename = "Humidity")]
  humidity:    f64,
  #[serde(rename = "Moisture")]
  moisture:    f64,
  #[serde(rename = "Soil Type")]
  soil_type:   String,
  #[serde(rename = "Crop Type")]
  crop_type:   String,
  #[serde(rename = "Nitrogen")]
  nitrogen:    f64,
  #[serde(rename = "Potassium")]
  potassium:   f64,
  #[serde(rename = "Phosphorous", alias = "Phosphorus")]
  phosphorus:  f64,
  #[serde(rename = "Fertilizer Name")]
  fertilizer:  String,
}

/// One labelled row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
  pub features:   FeatureVector,
  pub fertilizer: String,
}

/// A fully parsed dataset plus the digest of its source bytes.
#[derive(Debug, Clone)]
pub struct Dataset {
  pub samples: Vec<Sample>,
  /// Lowercase hex SHA-256 of the raw CSV.
  pub sha256:  String,
}

impl Dataset {
  /// Read and parse the CSV file at `path`.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Self::from_bytes(&bytes)
  }

  /// Parse CSV from memory.
  pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
    let sha256 = hex::encode(Sha256::digest(bytes));

    let mut reader = csv::ReaderBuilder::new()
      .trim(csv::Trim::All)
      .from_reader(bytes);

    let mut samples = Vec::new();
    for (index, record) in reader.deserialize::<Record>().enumerate() {
      let row = index + 1;
      let record = record?;
      let soil_type = SoilType::from_name(&record.soil_type)
        .map_err(|source| Error::Row { row, source })?;
      let crop_type = CropType::from_name(&record.crop_type)
        .map_err(|source| Error::Row { row, source })?;

      let reading = Reading {
        temperature: record.temperature,
        humidity: record.humidity,
        moisture: record.moisture,
        nitrogen: record.nitrogen,
        phosphorus: record.phosphorus,
        potassium: record.potassium,
        soil_type,
        crop_type,
      };
      samples.push(Sample {
        features:   FeatureVector::from_reading(&reading),
        fertilizer: record.fertilizer,
      });
    }

    if samples.is_empty() {
      return Err(Error::EmptyDataset);
    }
    Ok(Self { samples, sha256 })
  }

  pub fn len(&self) -> usize { self.samples.len() }

  pub fn is_empty(&self) -> bool { self.samples.is_empty() }
}
