//! Dataset → fitted [`ModelBundle`] + held-out [`EvaluationReport`].

use std::path::Path;

use chrono::Utc;
use smartcore::{
  ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
  },
  linalg::basic::matrix::DenseMatrix,
};
use soilsense_core::features::FEATURE_NAMES;

use crate::{
  CONFUSION_FILE, Dataset, Error, EvaluationReport, LabelEncoder, Manifest,
  ModelBundle, Result, StandardScaler, train_test_split,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
  /// Fraction of rows held out for evaluation.
  pub test_size: f64,
  /// Seeds both the split shuffle and the forest's bootstrap sampling.
  pub seed:      u64,
  pub n_trees:   u16,
}

impl Default for TrainOptions {
  fn default() -> Self {
    Self {
      test_size: 0.2,
      seed:      42,
      n_trees:   100,
    }
  }
}

pub struct TrainOutcome {
  pub bundle: ModelBundle,
  pub report: EvaluationReport,
}

impl TrainOutcome {
  /// Persist the bundle and the confusion matrix into `dir`.
  pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    self.bundle.save(dir)?;
    let path = dir.join(CONFUSION_FILE);
    let file = std::fs::File::create(&path).map_err(|e| Error::io(&path, e))?;
    self.report.write_confusion_csv(file)?;
    Ok(())
  }
}

/// Fit scaler and forest on a seeded split of `dataset` and score the
/// held-out rows.
pub fn train(dataset: &Dataset, options: &TrainOptions) -> Result<TrainOutcome> {
  if options.n_trees == 0 {
    return Err(Error::InvalidTreeCount);
  }
  let encoder =
    LabelEncoder::fit(dataset.samples.iter().map(|s| s.fertilizer.as_str()));
  let targets = dataset
    .samples
    .iter()
    .map(|s| encoder.transform(&s.fertilizer))
    .collect::<Result<Vec<u32>>>()?;

  let split = train_test_split(dataset.len(), options.test_size, options.seed)?;
  tracing::info!(
    rows = dataset.len(),
    train = split.train.len(),
    test = split.test.len(),
    classes = encoder.len(),
    "split dataset"
  );

  let scaler = StandardScaler::fit(
    split.train.iter().map(|&i| &dataset.samples[i].features),
  )?;
  let design = |indices: &[usize]| -> DenseMatrix<f64> {
    let rows: Vec<Vec<f64>> = indices
      .iter()
      .map(|&i| scaler.transform(&dataset.samples[i].features).to_vec())
      .collect();
    DenseMatrix::from_2d_vec(&rows)
  };
  let pick = |indices: &[usize]| -> Vec<u32> {
    indices.iter().map(|&i| targets[i]).collect()
  };

  let x_train = design(&split.train);
  let y_train = pick(&split.train);
  let x_test = design(&split.test);
  let y_test = pick(&split.test);

  tracing::info!(n_trees = options.n_trees, seed = options.seed, "fitting random forest");
  let parameters = RandomForestClassifierParameters::default()
    .with_n_trees(options.n_trees)
    .with_seed(options.seed);
  let forest = RandomForestClassifier::fit(&x_train, &y_train, parameters)?;

  let predicted = forest.predict(&x_test)?;
  let report = EvaluationReport::compute(encoder.classes(), &y_test, &predicted);
  tracing::info!(accuracy = report.accuracy, "evaluated on held-out rows");

  let manifest = Manifest {
    trained_at:     Utc::now(),
    dataset_sha256: dataset.sha256.clone(),
    train_rows:     split.train.len(),
    test_rows:      split.test.len(),
    n_trees:        options.n_trees,
    seed:           options.seed,
    test_size:      options.test_size,
    accuracy:       report.accuracy,
    feature_names:  FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
  };

  Ok(TrainOutcome {
    bundle: ModelBundle {
      forest,
      scaler,
      fertilizer: encoder,
      manifest,
    },
    report,
  })
}
