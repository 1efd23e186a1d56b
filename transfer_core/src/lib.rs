//! # Active Transfer Core
//!
//! Active learning for personalised binary classifiers with transfer from a
//! community model. Each resident has a labelled / unlabelled pool; a
//! selection policy picks the next example to label from the classifier's
//! current beliefs about its weights.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use active_transfer_core::{
//!     create_learners, BinaryModel, Experiment, ExperimentConfig, LearnerKind, ToyData,
//!     ToyDataConfig,
//! };
//!
//! let mut toy = ToyData::new(ToyDataConfig { num_residents: 2, num_features: 3, ..Default::default() })
//!     .unwrap();
//! let train = toy.generate(0.5, 20).unwrap();
//! let holdout = toy.generate(0.0, 50).unwrap();
//!
//! let config = ExperimentConfig::default();
//! let classifier = Arc::new(BinaryModel::default());
//! let priors = config.model.priors(train.num_features());
//!
//! let mut learners =
//!     create_learners(LearnerKind::Uncertainty, &train, Arc::clone(&classifier), &config).unwrap();
//! let mut experiment = Experiment::new("US", classifier, &config);
//! experiment.run_active(&train, &holdout, 5, &priors, &mut learners).unwrap();
//!
//! println!("Accuracy per round: {:?}", experiment.holdout_metrics().aggregate().average_accuracy);
//! ```
//!
//! ## Core Modules
//!
//! - [`learner`] - Selection policies, risk objective and labelled partition
//! - [`model`] - Probabilistic classifier trait and the hierarchical probit model
//! - [`data`] - Per-resident data sets, JSON loader and synthetic generator
//! - [`experiment`] - Batch, online and active protocols
//! - [`config`] - Experiment configuration via TOML
//! - [`logging`] - JSON line-delimited run journal
//! - [`checkpoint`] - Versioned belief-state snapshots

pub mod checkpoint;
pub mod config;
pub mod data;
pub mod experiment;
pub mod learner;
pub mod logging;
pub mod model;

pub use active_transfer_shared::{HoldoutMetricsCollection, Metrics, MetricsCollection};
pub use checkpoint::{CheckpointError, Checkpointable};
pub use config::{ConfigError, ExperimentConfig, ModelConfig, PolicyConfig, RunConfig};
pub use data::{DataError, DataLoader, DataSet, ToyData, ToyDataConfig};
pub use experiment::{create_learners, Experiment, LearnerKind};
pub use learner::{
    ActiveError, ActiveResult, EvidencePolicy, Objective, Partition, QueryCosts, RandomPolicy,
    RiskMatrix, RiskObjective, Selection, SelectionPolicy, UncertaintyPolicy, VoiPolicy,
};
pub use logging::{ExperimentSummary, SelectionJournal, SelectionLogEntry};
pub use model::{
    Bernoulli, BinaryModel, BinaryModelConfig, Gamma, Gaussian, Marginals, ModelError,
    ProbabilisticClassifier,
};
