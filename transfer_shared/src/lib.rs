//! Active Transfer Shared Library
//!
//! Running-metrics bookkeeping shared by the active transfer harness.
//!
//! This library provides:
//! - Per-prediction scores (log probability of truth, accuracy, Brier score)
//! - Cumulative learning curves for online and active runs
//! - Aggregate collections with per-position mean and standard deviation

pub mod collection;
pub mod metrics;
pub mod stats;

// Re-export commonly used types
pub use collection::{AggregateCurves, HoldoutMetricsCollection, MetricsCollection};
pub use metrics::{Metrics, Prediction};
pub use stats::{column_average, column_std_dev, mean, std_dev};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
