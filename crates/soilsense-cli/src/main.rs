//! `soilsense`: offline training and one-shot prediction.
//!
//! # Usage
//!
//! ```text
//! soilsense train --dataset dataset/data_core.csv --models-dir models
//! soilsense predict --temperature 26 --humidity 52 --moisture 38 \
//!   --nitrogen 37 --phosphorus 0 --potassium 0 --soil Sandy --crop Maize
//! soilsense labels
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use soilsense_core::{
  codes::{CropType, SoilType},
  features::FeatureVector,
  oracle::FertilizerOracle,
  reading::Reading,
};
use soilsense_model::{Dataset, ForestOracle, TrainOptions, train};
use strum::IntoEnumIterator;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "soilsense", version, about = "Fertilizer model training and prediction")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Train the random forest and write the model bundle.
  Train(TrainArgs),
  /// Predict a fertilizer for one reading.
  Predict(PredictArgs),
  /// List the fertilizer labels and the soil and crop code tables.
  Labels {
    #[arg(long, default_value = "models", env = "SOILSENSE_MODELS_DIR")]
    models_dir: PathBuf,
  },
}

#[derive(Args, Debug)]
struct TrainArgs {
  /// Training CSV.
  #[arg(long, default_value = "dataset/data_core.csv")]
  dataset:    PathBuf,
  #[arg(long, default_value = "models", env = "SOILSENSE_MODELS_DIR")]
  models_dir: PathBuf,
  /// Fraction of rows held out for evaluation.
  #[arg(long, default_value_t = 0.2)]
  test_size:  f64,
  #[arg(long, default_value_t = 42)]
  seed:       u64,
  /// Number of trees in the forest.
  #[arg(long, default_value_t = 100)]
  trees:      u16,
}

#[derive(Args, Debug)]
struct PredictArgs {
  #[arg(long, default_value = "models", env = "SOILSENSE_MODELS_DIR")]
  models_dir:  PathBuf,
  /// °C
  #[arg(long)]
  temperature: f64,
  /// %
  #[arg(long)]
  humidity:    f64,
  /// %
  #[arg(long)]
  moisture:    f64,
  #[arg(long)]
  nitrogen:    f64,
  #[arg(long)]
  phosphorus:  f64,
  #[arg(long)]
  potassium:   f64,
  /// Soil name or code, e.g. `Loamy` or `1`.
  #[arg(long, value_parser = parse_soil)]
  soil:        SoilType,
  /// Crop name or code, e.g. `Paddy` or `4`.
  #[arg(long, value_parser = parse_crop)]
  crop:        CropType,
}

fn parse_soil(raw: &str) -> Result<SoilType, String> {
  match raw.trim().parse::<i64>() {
    Ok(code) => SoilType::from_code(code),
    Err(_) => SoilType::from_name(raw),
  }
  .map_err(|e| e.to_string())
}

fn parse_crop(raw: &str) -> Result<CropType, String> {
  match raw.trim().parse::<i64>() {
    Ok(code) => CropType::from_code(code),
    Err(_) => CropType::from_name(raw),
  }
  .map_err(|e| e.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  match Cli::parse().command {
    Command::Train(args) => run_train(args),
    Command::Predict(args) => run_predict(args),
    Command::Labels { models_dir } => run_labels(models_dir),
  }
}

fn run_train(args: TrainArgs) -> Result<()> {
  let dataset = Dataset::open(&args.dataset)
    .with_context(|| format!("loading dataset {}", args.dataset.display()))?;
  tracing::info!(rows = dataset.len(), sha256 = %dataset.sha256, "loaded dataset");

  let options = TrainOptions {
    test_size: args.test_size,
    seed:      args.seed,
    n_trees:   args.trees,
  };
  let outcome = train(&dataset, &options).context("training failed")?;

  println!("Accuracy: {:.4}\n", outcome.report.accuracy);
  println!("{}", outcome.report);

  outcome
    .save(&args.models_dir)
    .with_context(|| format!("saving model bundle to {}", args.models_dir.display()))?;
  println!("Model saved to {}", args.models_dir.display());
  Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
  let oracle = load_oracle(&args.models_dir)?;
  let reading = Reading {
    temperature: args.temperature,
    humidity:    args.humidity,
    moisture:    args.moisture,
    nitrogen:    args.nitrogen,
    phosphorus:  args.phosphorus,
    potassium:   args.potassium,
    soil_type:   args.soil,
    crop_type:   args.crop,
  };

  let label = oracle
    .predict(&FeatureVector::from_reading(&reading))
    .context("prediction failed")?;
  println!("Recommended fertilizer: {label}");
  Ok(())
}

fn run_labels(models_dir: PathBuf) -> Result<()> {
  let oracle = load_oracle(&models_dir)?;

  println!("Fertilizers:");
  for label in oracle.labels() {
    println!("  {label}");
  }
  println!("\nSoil types:");
  for soil in SoilType::iter() {
    println!("  {:>2}  {soil}", soil.code());
  }
  println!("\nCrop types:");
  for crop in CropType::iter() {
    println!("  {:>2}  {crop}", crop.code());
  }
  Ok(())
}

fn load_oracle(models_dir: &Path) -> Result<ForestOracle> {
  ForestOracle::load(models_dir).with_context(|| {
    format!(
      "loading model from {} (run `soilsense train` first)",
      models_dir.display()
    )
  })
}
