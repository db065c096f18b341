//! The seam between the pipeline and whatever classifier backs it.

use std::collections::BTreeSet;

use crate::features::FeatureVector;

/// A trained classifier that maps a feature vector to a fertilizer label.
///
/// Implementors wrap the model together with its scaler and label encoder.
/// Prediction is synchronous and performs no I/O.
pub trait FertilizerOracle: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Predict the raw fertilizer label for `features`.
  fn predict(&self, features: &FeatureVector) -> Result<String, Self::Error>;

  /// The closed set of labels this oracle can emit, in lexical order.
  fn labels(&self) -> &BTreeSet<String>;
}
