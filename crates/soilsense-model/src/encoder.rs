//! Fertilizer name ⇄ class index.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maps each distinct label to its position in lexical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
  classes: Vec<String>,
}

impl LabelEncoder {
  pub fn fit<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let classes: BTreeSet<String> = labels
      .into_iter()
      .map(|label| label.as_ref().to_owned())
      .collect();
    Self {
      classes: classes.into_iter().collect(),
    }
  }

  /// Known labels, sorted.
  pub fn classes(&self) -> &[String] { &self.classes }

  pub fn len(&self) -> usize { self.classes.len() }

  pub fn is_empty(&self) -> bool { self.classes.is_empty() }

  pub fn transform(&self, label: &str) -> Result<u32> {
    self
      .classes
      .binary_search_by(|class| class.as_str().cmp(label))
      .map(|index| index as u32)
      .map_err(|_| Error::UnknownLabel(label.to_owned()))
  }

  pub fn inverse_transform(&self, index: u32) -> Result<&str> {
    self
      .classes
      .get(index as usize)
      .map(String::as_str)
      .ok_or(Error::UnknownClass(index))
  }
}
