//! Random-forest fertilizer model for SoilSense.
//!
//! Trains a classifier from the tabular soil dataset, persists it as a set of
//! JSON artifacts, and loads it back as a [`ForestOracle`] that implements
//! [`soilsense_core::oracle::FertilizerOracle`].

mod bundle;
mod dataset;
mod encoder;
mod metrics;
mod scaler;
mod split;
mod train;

pub mod error;

pub use bundle::{
  CONFUSION_FILE, ENCODER_FILE, ForestOracle, MANIFEST_FILE, MODEL_FILE,
  Manifest, ModelBundle, SCALER_FILE,
};
pub use dataset::{Dataset, Sample};
pub use encoder::LabelEncoder;
pub use error::{Error, Result};
pub use metrics::{ClassMetrics, EvaluationReport};
pub use scaler::StandardScaler;
pub use split::{Split, train_test_split};
pub use train::{TrainOptions, TrainOutcome, train};
