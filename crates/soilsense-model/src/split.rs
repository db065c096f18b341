//! Seeded train/test partitioning.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{Error, Result};

/// Row indices for each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
  pub train: Vec<usize>,
  pub test:  Vec<usize>,
}

/// Shuffle `0..rows` with `seed` and hold out `ceil(rows * test_size)` rows.
pub fn train_test_split(rows: usize, test_size: f64, seed: u64) -> Result<Split> {
  if !(test_size > 0.0 && test_size < 1.0) {
    return Err(Error::InvalidTestSize(test_size));
  }
  let n_test = (rows as f64 * test_size).ceil() as usize;
  if n_test == 0 || n_test >= rows {
    return Err(Error::DegenerateSplit { rows, test_size });
  }

  let mut indices: Vec<usize> = (0..rows).collect();
  indices.shuffle(&mut StdRng::seed_from_u64(seed));
  let train = indices.split_off(n_test);

  Ok(Split {
    train,
    test: indices,
  })
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;

  #[test]
  fn partitions_cover_every_row_once() {
    let split = train_test_split(10, 0.2, 42).unwrap();
    assert_eq!(split.test.len(), 2);
    assert_eq!(split.train.len(), 8);

    let all: BTreeSet<_> = split.train.iter().chain(&split.test).copied().collect();
    assert_eq!(all, (0..10).collect());
  }

  #[test]
  fn test_count_rounds_up() {
    assert_eq!(train_test_split(11, 0.2, 0).unwrap().test.len(), 3);
  }

  #[test]
  fn same_seed_same_split() {
    assert_eq!(
      train_test_split(50, 0.3, 7).unwrap(),
      train_test_split(50, 0.3, 7).unwrap()
    );
  }

  #[test]
  fn rejects_bad_fractions_and_tiny_inputs() {
    assert!(matches!(train_test_split(10, 0.0, 1), Err(Error::InvalidTestSize(_))));
    assert!(matches!(train_test_split(10, 1.0, 1), Err(Error::InvalidTestSize(_))));
    assert!(matches!(
      train_test_split(1, 0.5, 1),
      Err(Error::DegenerateSplit { .. })
    ));
  }
}
