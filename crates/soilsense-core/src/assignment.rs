//! Per-soil fertilizer assignments and the resolver that consults them.
//!
//! The table remembers which fertilizer was last recommended for every
//! (soil, crop) pair seen by the process. When the oracle proposes a label
//! that another crop on the same soil already holds, the resolver swaps in an
//! unused label if one exists.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::codes::{CropType, SoilType};

// ─── Table ───────────────────────────────────────────────────────────────────

/// soil → crop → label. Grows for the lifetime of the process; never pruned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssignmentTable {
  soils: BTreeMap<SoilType, BTreeMap<CropType, String>>,
}

impl AssignmentTable {
  pub fn new() -> Self { Self::default() }

  /// The label currently held by `(soil, crop)`, if any.
  pub fn get(&self, soil: SoilType, crop: CropType) -> Option<&str> {
    self
      .soils
      .get(&soil)
      .and_then(|crops| crops.get(&crop))
      .map(String::as_str)
  }

  /// All assignments recorded under `soil`.
  pub fn crops(&self, soil: SoilType) -> Option<&BTreeMap<CropType, String>> {
    self.soils.get(&soil)
  }

  /// Labels held by crops on `soil` other than `crop`.
  pub fn held_by_others(&self, soil: SoilType, crop: CropType) -> BTreeSet<&str> {
    self
      .soils
      .get(&soil)
      .into_iter()
      .flatten()
      .filter(|(c, _)| **c != crop)
      .map(|(_, label)| label.as_str())
      .collect()
  }

  /// Record `label` for `(soil, crop)`, replacing any previous value.
  pub fn record(&mut self, soil: SoilType, crop: CropType, label: impl Into<String>) {
    self
      .soils
      .entry(soil)
      .or_default()
      .insert(crop, label.into());
  }

  /// Number of (soil, crop) pairs recorded.
  pub fn len(&self) -> usize { self.soils.values().map(BTreeMap::len).sum() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Decide the fertilizer to report for `(soil, crop)` and record it.
///
/// - A label not yet held by another crop on this soil is accepted as-is.
/// - On a collision, the lexically first label in `all_labels` not held by
///   another crop on this soil replaces it.
/// - If every label is taken, the collision is accepted.
/// - A label outside `all_labels` is passed through untouched.
///
/// The chosen label is always written to the table.
pub fn resolve(
  soil: SoilType,
  crop: CropType,
  raw_prediction: &str,
  table: &mut AssignmentTable,
  all_labels: &BTreeSet<String>,
) -> String {
  let chosen = {
    let taken = table.held_by_others(soil, crop);

    if !all_labels.contains(raw_prediction) || !taken.contains(raw_prediction) {
      raw_prediction.to_owned()
    } else {
      match all_labels.iter().find(|label| !taken.contains(label.as_str())) {
        Some(alternative) => {
          tracing::debug!(
            %soil,
            %crop,
            from = raw_prediction,
            to = %alternative,
            "substituted fertilizer already held on this soil"
          );
          alternative.clone()
        }
        None => {
          tracing::debug!(
            %soil,
            %crop,
            label = raw_prediction,
            "no unused fertilizer left on this soil; keeping prediction"
          );
          raw_prediction.to_owned()
        }
      }
    }
  };

  table.record(soil, crop, chosen.clone());
  chosen
}

#[cfg(test)]
mod tests {
  use super::*;

  fn labels(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
  }

  fn soil(code: i64) -> SoilType { SoilType::from_code(code).unwrap() }

  fn crop(code: i64) -> CropType { CropType::from_code(code).unwrap() }

  #[test]
  fn unseen_soil_accepts_prediction() {
    let mut table = AssignmentTable::new();
    let all = labels(&["Urea", "DAP", "MOP"]);

    let got = resolve(soil(3), crop(0), "MOP", &mut table, &all);

    assert_eq!(got, "MOP");
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(soil(3), crop(0)), Some("MOP"));
  }

  #[test]
  fn collision_picks_an_unused_label() {
    let mut table = AssignmentTable::new();
    table.record(soil(1), crop(0), "Urea");
    let all = labels(&["Urea", "DAP", "MOP"]);

    let got = resolve(soil(1), crop(2), "Urea", &mut table, &all);

    assert!(got == "DAP" || got == "MOP", "got {got}");
    assert_ne!(got, "Urea");
    let crops = table.crops(soil(1)).unwrap();
    assert_eq!(crops.len(), 2);
    assert_eq!(crops[&crop(0)], "Urea");
    assert_eq!(crops[&crop(2)], got);
  }

  #[test]
  fn alternative_is_lexically_first() {
    let mut table = AssignmentTable::new();
    table.record(soil(1), crop(0), "Urea");
    let all = labels(&["Urea", "MOP", "DAP"]);

    assert_eq!(resolve(soil(1), crop(2), "Urea", &mut table, &all), "DAP");
  }

  #[test]
  fn collision_without_alternative_keeps_prediction() {
    let mut table = AssignmentTable::new();
    table.record(soil(2), crop(1), "Urea");
    let all = labels(&["Urea"]);

    let got = resolve(soil(2), crop(4), "Urea", &mut table, &all);

    assert_eq!(got, "Urea");
    assert_eq!(table.get(soil(2), crop(4)), Some("Urea"));
    assert_eq!(table.get(soil(2), crop(1)), Some("Urea"));
  }

  #[test]
  fn repeated_calls_yield_the_same_label() {
    let mut table = AssignmentTable::new();
    table.record(soil(1), crop(0), "Urea");
    let all = labels(&["Urea", "DAP", "MOP"]);

    let first = resolve(soil(1), crop(2), "Urea", &mut table, &all);
    let second = resolve(soil(1), crop(2), "Urea", &mut table, &all);

    assert_eq!(first, second);
    assert_eq!(table.len(), 2);
  }

  #[test]
  fn other_soils_do_not_collide() {
    let mut table = AssignmentTable::new();
    table.record(soil(0), crop(0), "Urea");
    let all = labels(&["Urea", "DAP"]);

    assert_eq!(resolve(soil(4), crop(1), "Urea", &mut table, &all), "Urea");
  }

  #[test]
  fn unknown_label_passes_through_and_is_recorded() {
    let mut table = AssignmentTable::new();
    table.record(soil(1), crop(0), "Compost");
    let all = labels(&["Urea", "DAP"]);

    let got = resolve(soil(1), crop(5), "Compost", &mut table, &all);

    assert_eq!(got, "Compost");
    assert_eq!(table.get(soil(1), crop(5)), Some("Compost"));
  }

  #[test]
  fn reassigning_a_crop_overwrites_its_entry() {
    let mut table = AssignmentTable::new();
    let all = labels(&["Urea", "DAP", "MOP"]);

    resolve(soil(1), crop(3), "MOP", &mut table, &all);
    resolve(soil(1), crop(3), "DAP", &mut table, &all);

    assert_eq!(table.len(), 1);
    assert_eq!(table.get(soil(1), crop(3)), Some("DAP"));
  }

  #[test]
  fn table_serialises_by_code() {
    let mut table = AssignmentTable::new();
    table.record(soil(3), crop(0), "MOP");
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json, serde_json::json!({ "3": { "0": "MOP" } }));
  }
}
