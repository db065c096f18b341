//! Dashboard route handlers.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET`  | `/` | [`dashboard::page`] |
//! | `GET`  | `/sensor-data` | [`readings::poll`] |
//! | `POST` | `/sensor-data` | [`readings::ingest`] |
//! | `POST` | `/update-crop` | [`readings::update_crop`] |
//! | `POST` | `/update-soil` | [`readings::update_soil`] |
//! | `GET`  | `/assignments` | [`assignments::list`] |

pub mod assignments;
pub mod dashboard;
pub mod readings;
