//! Data module for per-resident binary classification data
//!
//! Provides the [`DataSet`] container with owned sub-setting, a synthetic
//! generator matching the hierarchical model, and a JSON loader for recorded
//! sensor data.

pub mod dataset;
pub mod error;
pub mod loader;
pub mod toy;

pub use dataset::DataSet;
pub use error::{DataError, DataResult};
pub use loader::DataLoader;
pub use toy::{ToyData, ToyDataConfig};
