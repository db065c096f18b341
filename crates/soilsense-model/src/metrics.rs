//! Held-out evaluation: per-class precision/recall/F1 and a confusion matrix.

use std::{fmt, io, iter};

use serde::Serialize;

/// Scores for one fertilizer class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
  pub label:     String,
  pub precision: f64,
  pub recall:    f64,
  pub f1:        f64,
  /// Number of test rows whose true class is `label`.
  pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
  pub accuracy:  f64,
  pub classes:   Vec<ClassMetrics>,
  /// `confusion[true][predicted]`, indexed in label order.
  pub confusion: Vec<Vec<usize>>,
}

impl EvaluationReport {
  /// Score `predicted` against `truth`. Both hold class indices into
  /// `labels`; indices outside it are ignored.
  pub fn compute(labels: &[String], truth: &[u32], predicted: &[u32]) -> Self {
    let k = labels.len();
    let mut confusion = vec![vec![0usize; k]; k];
    let mut correct = 0usize;
    let mut total = 0usize;

    for (&t, &p) in truth.iter().zip(predicted) {
      let (t, p) = (t as usize, p as usize);
      if t >= k || p >= k {
        continue;
      }
      confusion[t][p] += 1;
      total += 1;
      if t == p {
        correct += 1;
      }
    }

    let classes = labels
      .iter()
      .enumerate()
      .map(|(i, label)| {
        let tp = confusion[i][i];
        let support: usize = confusion[i].iter().sum();
        let predicted_as: usize = confusion.iter().map(|row| row[i]).sum();
        let precision = ratio(tp, predicted_as);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
          2.0 * precision * recall / (precision + recall)
        } else {
          0.0
        };
        ClassMetrics {
          label: label.clone(),
          precision,
          recall,
          f1,
          support,
        }
      })
      .collect();

    Self {
      accuracy: ratio(correct, total),
      classes,
      confusion,
    }
  }

  pub fn support(&self) -> usize { self.classes.iter().map(|c| c.support).sum() }

  /// Unweighted mean of (precision, recall, f1) across classes.
  pub fn macro_avg(&self) -> (f64, f64, f64) {
    let n = self.classes.len() as f64;
    if n == 0.0 {
      return (0.0, 0.0, 0.0);
    }
    let sum = self.classes.iter().fold((0.0, 0.0, 0.0), |acc, c| {
      (acc.0 + c.precision, acc.1 + c.recall, acc.2 + c.f1)
    });
    (sum.0 / n, sum.1 / n, sum.2 / n)
  }

  /// Support-weighted mean of (precision, recall, f1) across classes.
  pub fn weighted_avg(&self) -> (f64, f64, f64) {
    let total = self.support() as f64;
    if total == 0.0 {
      return (0.0, 0.0, 0.0);
    }
    let sum = self.classes.iter().fold((0.0, 0.0, 0.0), |acc, c| {
      let w = c.support as f64;
      (acc.0 + w * c.precision, acc.1 + w * c.recall, acc.2 + w * c.f1)
    });
    (sum.0 / total, sum.1 / total, sum.2 / total)
  }

  /// Write the confusion matrix as CSV: a header row of predicted labels,
  /// then one row per true label.
  pub fn write_confusion_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(
      iter::once("true\\predicted").chain(self.classes.iter().map(|c| c.label.as_str())),
    )?;
    for (class, row) in self.classes.iter().zip(&self.confusion) {
      out.write_record(
        iter::once(class.label.clone()).chain(row.iter().map(usize::to_string)),
      )?;
    }
    out.flush()?;
    Ok(())
  }
}

impl fmt::Display for EvaluationReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let width = self
      .classes
      .iter()
      .map(|c| c.label.len())
      .chain(["weighted avg".len()])
      .max()
      .unwrap_or(0);

    writeln!(
      f,
      "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
      "", "precision", "recall", "f1-score", "support"
    )?;
    writeln!(f)?;
    for c in &self.classes {
      writeln!(
        f,
        "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
        c.label, c.precision, c.recall, c.f1, c.support
      )?;
    }
    writeln!(f)?;
    let support = self.support();
    writeln!(
      f,
      "{:>width$}  {:>9}  {:>9}  {:>9.2}  {:>9}",
      "accuracy", "", "", self.accuracy, support
    )?;
    let (p, r, f1) = self.macro_avg();
    writeln!(
      f,
      "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
      "macro avg", p, r, f1, support
    )?;
    let (p, r, f1) = self.weighted_avg();
    write!(
      f,
      "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
      "weighted avg", p, r, f1, support
    )
  }
}

fn ratio(num: usize, den: usize) -> f64 {
  if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
