//! Persisted model artifacts and the oracle built from them.
//!
//! A models directory holds one JSON file per artifact:
//!
//! | File | Content |
//! |------|---------|
//! | `soil_testing_model.json` | fitted random forest |
//! | `scaler.json` | [`StandardScaler`] |
//! | `fertilizer_encoder.json` | [`LabelEncoder`] |
//! | `manifest.json` | [`Manifest`] |
//! | `confusion_matrix.csv` | written by training; not needed to load |

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use smartcore::{
  ensemble::random_forest_classifier::RandomForestClassifier,
  linalg::basic::matrix::DenseMatrix,
};
use soilsense_core::{features::FeatureVector, oracle::FertilizerOracle};

use crate::{Error, LabelEncoder, Result, StandardScaler};

pub const MODEL_FILE: &str = "soil_testing_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const ENCODER_FILE: &str = "fertilizer_encoder.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const CONFUSION_FILE: &str = "confusion_matrix.csv";

pub(crate) type Forest =
  RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

// ─── Manifest ────────────────────────────────────────────────────────────────

/// Provenance for a trained bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  pub trained_at:     DateTime<Utc>,
  /// SHA-256 of the CSV the model was trained on.
  pub dataset_sha256: String,
  pub train_rows:     usize,
  pub test_rows:      usize,
  pub n_trees:        u16,
  pub seed:           u64,
  pub test_size:      f64,
  /// Held-out accuracy at training time.
  pub accuracy:       f64,
  pub feature_names:  Vec<String>,
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Forest + scaler + label encoder + manifest.
pub struct ModelBundle {
  pub(crate) forest: Forest,
  pub scaler:        StandardScaler,
  pub fertilizer:    LabelEncoder,
  pub manifest:      Manifest,
}

impl ModelBundle {
  /// Write every artifact into `dir`, creating it if needed.
  pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    write_json(&dir.join(MODEL_FILE), &self.forest)?;
    write_json(&dir.join(SCALER_FILE), &self.scaler)?;
    write_json(&dir.join(ENCODER_FILE), &self.fertilizer)?;
    write_json(&dir.join(MANIFEST_FILE), &self.manifest)?;
    Ok(())
  }

  /// Load a bundle previously written by [`ModelBundle::save`].
  pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    Ok(Self {
      forest:     read_json(&dir.join(MODEL_FILE))?,
      scaler:     read_json(&dir.join(SCALER_FILE))?,
      fertilizer: read_json(&dir.join(ENCODER_FILE))?,
      manifest:   read_json(&dir.join(MANIFEST_FILE))?,
    })
  }

  /// Predict the class index for one feature vector.
  fn predict_class(&self, features: &FeatureVector) -> Result<u32> {
    let scaled = self.scaler.transform(features);
    let x = DenseMatrix::from_2d_vec(&vec![scaled.to_vec()]);
    let y = self.forest.predict(&x)?;
    y.first().copied().ok_or(Error::EmptyPrediction)
  }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
  let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
  serde_json::to_writer(std::io::BufWriter::new(file), value)?;
  Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
  if !path.exists() {
    return Err(Error::MissingArtifact(path.to_path_buf()));
  }
  let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
  Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

// ─── Oracle ──────────────────────────────────────────────────────────────────

/// A loaded [`ModelBundle`] answering [`FertilizerOracle`] queries.
pub struct ForestOracle {
  bundle: ModelBundle,
  labels: BTreeSet<String>,
}

impl ForestOracle {
  pub fn new(bundle: ModelBundle) -> Self {
    let labels = bundle.fertilizer.classes().iter().cloned().collect();
    Self { bundle, labels }
  }

  /// Load the bundle in `dir`.
  pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    let bundle = ModelBundle::load(dir)?;
    tracing::info!(
      dir = %dir.display(),
      trained_at = %bundle.manifest.trained_at,
      dataset = %bundle.manifest.dataset_sha256,
      classes = bundle.fertilizer.len(),
      "loaded fertilizer model"
    );
    Ok(Self::new(bundle))
  }

  pub fn manifest(&self) -> &Manifest { &self.bundle.manifest }
}

impl FertilizerOracle for ForestOracle {
  type Error = Error;

  fn predict(&self, features: &FeatureVector) -> Result<String> {
    let class = self.bundle.predict_class(features)?;
    Ok(self.bundle.fertilizer.inverse_transform(class)?.to_owned())
  }

  fn labels(&self) -> &BTreeSet<String> { &self.labels }
}
