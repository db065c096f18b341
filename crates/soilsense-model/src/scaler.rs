//! Per-feature standardisation.

use serde::{Deserialize, Serialize};
use soilsense_core::features::{FEATURE_COUNT, FeatureVector};

use crate::{Error, Result};

/// Centres each feature on its training mean and divides by the population
/// standard deviation. Constant features are divided by 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
  mean:  [f64; FEATURE_COUNT],
  scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
  pub fn fit<'a, I>(rows: I) -> Result<Self>
  where
    I: IntoIterator<Item = &'a FeatureVector>,
  {
    let rows: Vec<&[f64; FEATURE_COUNT]> =
      rows.into_iter().map(FeatureVector::as_array).collect();
    if rows.is_empty() {
      return Err(Error::EmptyDataset);
    }
    let n = rows.len() as f64;

    let mut mean = [0.0; FEATURE_COUNT];
    for row in &rows {
      for (m, v) in mean.iter_mut().zip(row.iter()) {
        *m += v;
      }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    let mut scale = [0.0; FEATURE_COUNT];
    for row in &rows {
      for ((s, v), m) in scale.iter_mut().zip(row.iter()).zip(mean.iter()) {
        *s += (v - m).powi(2);
      }
    }
    for s in scale.iter_mut() {
      let std = (*s / n).sqrt();
      *s = if std > f64::EPSILON { std } else { 1.0 };
    }

    Ok(Self { mean, scale })
  }

  pub fn transform(&self, features: &FeatureVector) -> [f64; FEATURE_COUNT] {
    let mut out = *features.as_array();
    for ((v, m), s) in out.iter_mut().zip(&self.mean).zip(&self.scale) {
      *v = (*v - m) / s;
    }
    out
  }

  pub fn mean(&self) -> &[f64; FEATURE_COUNT] { &self.mean }

  pub fn scale(&self) -> &[f64; FEATURE_COUNT] { &self.scale }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(first: f64, second: f64) -> FeatureVector {
    FeatureVector::from([first, second, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0])
  }

  #[test]
  fn fitted_training_data_is_standardised() {
    let rows = [row(1.0, 10.0), row(3.0, 30.0)];
    let scaler = StandardScaler::fit(&rows).unwrap();

    assert_eq!(scaler.mean()[0], 2.0);
    assert_eq!(scaler.scale()[0], 1.0);
    assert_eq!(scaler.scale()[1], 10.0);

    let out = scaler.transform(&rows[1]);
    assert_eq!(out[0], 1.0);
    assert_eq!(out[1], 1.0);
  }

  #[test]
  fn constant_columns_only_centre() {
    let rows = [row(1.0, 1.0), row(2.0, 2.0)];
    let scaler = StandardScaler::fit(&rows).unwrap();
    assert_eq!(scaler.scale()[2], 1.0);
    assert_eq!(scaler.transform(&rows[0])[2], 0.0);
  }

  #[test]
  fn empty_input_is_rejected() {
    assert!(matches!(
      StandardScaler::fit(std::iter::empty()),
      Err(Error::EmptyDataset)
    ));
  }
}
