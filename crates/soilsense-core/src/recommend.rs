//! Reading → oracle → resolver.

use crate::{
  assignment::{AssignmentTable, resolve},
  features::FeatureVector,
  oracle::FertilizerOracle,
  reading::Reading,
};

/// Recommend a fertilizer for `reading`, recording it in `table`.
///
/// The caller owns `table` and must hold it exclusively for the whole call;
/// the resolver reads the current assignments and writes the new one.
pub fn recommend<O>(
  oracle: &O,
  reading: &Reading,
  table: &mut AssignmentTable,
) -> Result<String, O::Error>
where
  O: FertilizerOracle + ?Sized,
{
  let features = FeatureVector::from_reading(reading);
  let raw = oracle.predict(&features)?;
  Ok(resolve(
    reading.soil_type,
    reading.crop_type,
    &raw,
    table,
    oracle.labels(),
  ))
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::codes::{CropType, SoilType};

  /// Predicts by nitrogen level.
  struct ThresholdOracle {
    labels: BTreeSet<String>,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("negative nitrogen")]
  struct NegativeNitrogen;

  impl ThresholdOracle {
    fn new() -> Self {
      Self {
        labels: ["Urea", "DAP", "MOP"].into_iter().map(String::from).collect(),
      }
    }
  }

  impl FertilizerOracle for ThresholdOracle {
    type Error = NegativeNitrogen;

    fn predict(&self, features: &FeatureVector) -> Result<String, Self::Error> {
      let nitrogen = features.as_array()[5];
      if nitrogen < 0.0 {
        return Err(NegativeNitrogen);
      }
      Ok(if nitrogen < 30.0 { "Urea" } else { "MOP" }.to_string())
    }

    fn labels(&self) -> &BTreeSet<String> { &self.labels }
  }

  #[test]
  fn first_recommendation_is_the_raw_prediction() {
    let oracle = ThresholdOracle::new();
    let mut table = AssignmentTable::new();

    let got = recommend(&oracle, &Reading::default(), &mut table).unwrap();

    assert_eq!(got, "Urea");
    assert_eq!(table.get(SoilType::Loamy, CropType::Maize), Some("Urea"));
  }

  #[test]
  fn second_crop_on_same_soil_is_steered_away() {
    let oracle = ThresholdOracle::new();
    let mut table = AssignmentTable::new();
    let mut reading = Reading::default();

    recommend(&oracle, &reading, &mut table).unwrap();
    reading.crop_type = CropType::Paddy;
    let got = recommend(&oracle, &reading, &mut table).unwrap();

    assert_eq!(got, "DAP");
  }

  #[test]
  fn oracle_errors_leave_the_table_untouched() {
    let oracle = ThresholdOracle::new();
    let mut table = AssignmentTable::new();
    let reading = Reading {
      nitrogen: -1.0,
      ..Reading::default()
    };

    assert!(recommend(&oracle, &reading, &mut table).is_err());
    assert!(table.is_empty());
  }
}
