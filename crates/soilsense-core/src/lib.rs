//! Core types for the SoilSense fertilizer pipeline.
//!
//! This crate is free of HTTP, file and model-format dependencies. It owns the
//! reading model, the feature vector layout, the [`FertilizerOracle`] seam and
//! the assignment table that keeps crops on the same soil from being handed
//! the same fertilizer.
//!
//! [`FertilizerOracle`]: oracle::FertilizerOracle

pub mod assignment;
pub mod codes;
pub mod error;
pub mod features;
pub mod oracle;
pub mod reading;
pub mod recommend;

pub use error::{Error, Result};
