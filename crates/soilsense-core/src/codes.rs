//! Soil and crop code tables.
//!
//! Both are closed sets. On the wire they travel as their integer code (the
//! value devices and the dashboard selectors send); for humans they display by
//! name.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr};

use crate::{Error, Result};

// ─── Soil ────────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  FromRepr,
)]
#[serde(try_from = "u8", into = "u8")]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum SoilType {
  Sandy  = 0,
  Loamy  = 1,
  Black  = 2,
  Red    = 3,
  Clayey = 4,
}

impl SoilType {
  pub fn code(self) -> u8 { self as u8 }

  /// Look up a soil type by its integer code.
  pub fn from_code(code: i64) -> Result<Self> {
    u8::try_from(code)
      .ok()
      .and_then(Self::from_repr)
      .ok_or(Error::UnknownSoilType(code))
  }

  /// Look up a soil type by name, ignoring ASCII case.
  pub fn from_name(name: &str) -> Result<Self> {
    name
      .trim()
      .parse()
      .map_err(|_| Error::UnknownSoilName(name.to_owned()))
  }
}

impl Default for SoilType {
  fn default() -> Self { Self::Loamy }
}

impl TryFrom<u8> for SoilType {
  type Error = Error;

  fn try_from(code: u8) -> Result<Self> { Self::from_code(code.into()) }
}

impl From<SoilType> for u8 {
  fn from(soil: SoilType) -> Self { soil.code() }
}

// ─── Crop ────────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  FromRepr,
)]
#[serde(try_from = "u8", into = "u8")]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum CropType {
  Maize      = 0,
  Sugarcane  = 1,
  Cotton     = 2,
  Tobacco    = 3,
  Paddy      = 4,
  Barley     = 5,
  Wheat      = 6,
  Millets    = 7,
  #[strum(serialize = "Oil seeds")]
  OilSeeds   = 8,
  Pulses     = 9,
  #[strum(serialize = "Ground Nuts")]
  GroundNuts = 10,
}

impl CropType {
  pub fn code(self) -> u8 { self as u8 }

  /// Look up a crop type by its integer code.
  pub fn from_code(code: i64) -> Result<Self> {
    u8::try_from(code)
      .ok()
      .and_then(Self::from_repr)
      .ok_or(Error::UnknownCropType(code))
  }

  /// Look up a crop type by name, ignoring ASCII case.
  pub fn from_name(name: &str) -> Result<Self> {
    name
      .trim()
      .parse()
      .map_err(|_| Error::UnknownCropName(name.to_owned()))
  }
}

impl Default for CropType {
  fn default() -> Self { Self::Maize }
}

impl TryFrom<u8> for CropType {
  type Error = Error;

  fn try_from(code: u8) -> Result<Self> { Self::from_code(code.into()) }
}

impl From<CropType> for u8 {
  fn from(crop: CropType) -> Self { crop.code() }
}
