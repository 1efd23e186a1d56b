//! Experiment configuration via TOML files.
//!
//! Every section and field is optional; missing values take the defaults
//! shipped in `config/experiment.toml`.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::learner::{QueryCosts, RiskMatrix, RiskObjective};
use crate::model::{BinaryModel, BinaryModelConfig, Gamma, Gaussian, Marginals};

/// Full experiment configuration.
///
/// # Examples
///
/// ```
/// use active_transfer_core::ExperimentConfig;
///
/// let config = ExperimentConfig::load_from_file("config/experiment.toml")
///     .unwrap_or_default();
///
/// println!("Active steps: {}", config.experiment.active_steps);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExperimentConfig {
    pub experiment: RunConfig,
    pub risk: RiskObjective,
    pub policy: PolicyConfig,
    pub model: ModelConfig,
}

impl ExperimentConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }
}

impl FromStr for ExperimentConfig {
    type Err = ConfigError;

    fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawExperimentConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;

        Ok(Self {
            experiment: RunConfig::try_from(&raw.experiment)?,
            risk: risk_from_raw(&raw.risk)?,
            policy: PolicyConfig::try_from(&raw.policy)?,
            model: ModelConfig::try_from(&raw.model)?,
        })
    }
}

/// Round loop settings.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Selections per resident in the active loop
    pub active_steps: usize,
    /// Sweeps for batch and online training
    pub train_iterations: usize,
    /// Sweeps when retraining on a newly labelled example
    pub update_iterations: usize,
    /// Sweeps for hypothetical retraining inside VOI / evidence
    pub hypothesis_iterations: usize,
    /// Examples per class labelled before the loop starts
    pub seed_per_class: usize,
    /// Append round records to `logs/active.jsonl`
    pub journal: bool,
}

impl RunConfig {
    fn try_from(raw: &RawRun) -> Result<Self, ConfigError> {
        if raw.train_iterations == 0 {
            return Err(ConfigError::Parse(
                "experiment.train_iterations must be ≥ 1".into(),
            ));
        }
        if raw.update_iterations == 0 {
            return Err(ConfigError::Parse(
                "experiment.update_iterations must be ≥ 1".into(),
            ));
        }
        if raw.hypothesis_iterations == 0 {
            return Err(ConfigError::Parse(
                "experiment.hypothesis_iterations must be ≥ 1".into(),
            ));
        }

        Ok(Self {
            active_steps: raw.active_steps,
            train_iterations: raw.train_iterations,
            update_iterations: raw.update_iterations,
            hypothesis_iterations: raw.hypothesis_iterations,
            seed_per_class: raw.seed_per_class,
            journal: raw.journal,
        })
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            active_steps: default_active_steps(),
            train_iterations: default_train_iterations(),
            update_iterations: default_update_iterations(),
            hypothesis_iterations: default_hypothesis_iterations(),
            seed_per_class: 0,
            journal: false,
        }
    }
}

fn risk_from_raw(raw: &RawRisk) -> Result<RiskObjective, ConfigError> {
    let risk = RiskMatrix::new(raw.matrix)
        .map_err(|err| ConfigError::Parse(format!("risk.matrix: {}", err)))?;
    let costs =
        QueryCosts::new(raw.costs).map_err(|err| ConfigError::Parse(format!("risk.costs: {}", err)))?;
    Ok(RiskObjective::new(risk, costs))
}

/// Seeds and sizes used by the selection policies.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyConfig {
    pub random_seed: u64,
    pub transfer_seed: u64,
    pub evidence_seed: u64,
    pub shortlist_size: usize,
}

impl PolicyConfig {
    fn try_from(raw: &RawPolicy) -> Result<Self, ConfigError> {
        if raw.shortlist_size == 0 {
            return Err(ConfigError::Parse(
                "policy.shortlist_size must be ≥ 1".into(),
            ));
        }

        Ok(Self {
            random_seed: raw.random_seed,
            transfer_seed: raw.transfer_seed,
            evidence_seed: raw.evidence_seed,
            shortlist_size: raw.shortlist_size,
        })
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            random_seed: 0,
            transfer_seed: 0,
            evidence_seed: default_evidence_seed(),
            shortlist_size: default_shortlist_size(),
        }
    }
}

/// Classifier noise and the isotropic weight prior.
#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub noise_precision: f64,
    pub prior_mean: f64,
    pub prior_variance: f64,
    pub prior_precision_shape: f64,
    pub prior_precision_rate: f64,
}

impl ModelConfig {
    fn try_from(raw: &RawModel) -> Result<Self, ConfigError> {
        if !raw.noise_precision.is_finite() || raw.noise_precision <= 0.0 {
            return Err(ConfigError::Parse(
                "model.noise_precision must be positive".into(),
            ));
        }
        if !raw.prior_mean.is_finite() {
            return Err(ConfigError::Parse("model.prior_mean must be finite".into()));
        }
        if !raw.prior_variance.is_finite() || raw.prior_variance <= 0.0 {
            return Err(ConfigError::Parse(
                "model.prior_variance must be positive".into(),
            ));
        }
        if !raw.prior_precision_shape.is_finite() || raw.prior_precision_shape <= 0.0 {
            return Err(ConfigError::Parse(
                "model.prior_precision_shape must be positive".into(),
            ));
        }
        if !raw.prior_precision_rate.is_finite() || raw.prior_precision_rate <= 0.0 {
            return Err(ConfigError::Parse(
                "model.prior_precision_rate must be positive".into(),
            ));
        }

        Ok(Self {
            noise_precision: raw.noise_precision,
            prior_mean: raw.prior_mean,
            prior_variance: raw.prior_variance,
            prior_precision_shape: raw.prior_precision_shape,
            prior_precision_rate: raw.prior_precision_rate,
        })
    }

    /// Isotropic priors over `num_features` weights.
    pub fn priors(&self, num_features: usize) -> Marginals {
        Marginals::isotropic(
            num_features,
            Gaussian::new(self.prior_mean, self.prior_variance),
            Gamma::new(self.prior_precision_shape, self.prior_precision_rate),
        )
    }

    pub fn classifier(&self) -> BinaryModel {
        BinaryModel::new(BinaryModelConfig {
            noise_precision: self.noise_precision,
        })
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            noise_precision: 1.0,
            prior_mean: 0.0,
            prior_variance: 1.0,
            prior_precision_shape: 1.0,
            prior_precision_rate: 1.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawExperimentConfig {
    #[serde(default)]
    experiment: RawRun,
    #[serde(default)]
    risk: RawRisk,
    #[serde(default)]
    policy: RawPolicy,
    #[serde(default)]
    model: RawModel,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    #[serde(default = "default_active_steps")]
    active_steps: usize,
    #[serde(default = "default_train_iterations")]
    train_iterations: usize,
    #[serde(default = "default_update_iterations")]
    update_iterations: usize,
    #[serde(default = "default_hypothesis_iterations")]
    hypothesis_iterations: usize,
    #[serde(default)]
    seed_per_class: usize,
    #[serde(default)]
    journal: bool,
}

impl Default for RawRun {
    fn default() -> Self {
        Self {
            active_steps: default_active_steps(),
            train_iterations: default_train_iterations(),
            update_iterations: default_update_iterations(),
            hypothesis_iterations: default_hypothesis_iterations(),
            seed_per_class: 0,
            journal: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRisk {
    #[serde(default = "default_risk_matrix")]
    matrix: [[f64; 2]; 2],
    #[serde(default = "default_costs")]
    costs: [f64; 2],
}

impl Default for RawRisk {
    fn default() -> Self {
        Self {
            matrix: default_risk_matrix(),
            costs: default_costs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPolicy {
    #[serde(default)]
    random_seed: u64,
    #[serde(default)]
    transfer_seed: u64,
    #[serde(default = "default_evidence_seed")]
    evidence_seed: u64,
    #[serde(default = "default_shortlist_size")]
    shortlist_size: usize,
}

impl Default for RawPolicy {
    fn default() -> Self {
        Self {
            random_seed: 0,
            transfer_seed: 0,
            evidence_seed: default_evidence_seed(),
            shortlist_size: default_shortlist_size(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(default = "default_one")]
    noise_precision: f64,
    #[serde(default)]
    prior_mean: f64,
    #[serde(default = "default_one")]
    prior_variance: f64,
    #[serde(default = "default_one")]
    prior_precision_shape: f64,
    #[serde(default = "default_one")]
    prior_precision_rate: f64,
}

impl Default for RawModel {
    fn default() -> Self {
        Self {
            noise_precision: 1.0,
            prior_mean: 0.0,
            prior_variance: 1.0,
            prior_precision_shape: 1.0,
            prior_precision_rate: 1.0,
        }
    }
}

fn default_active_steps() -> usize {
    20
}

fn default_train_iterations() -> usize {
    10
}

fn default_update_iterations() -> usize {
    50
}

fn default_hypothesis_iterations() -> usize {
    1
}

fn default_risk_matrix() -> [[f64; 2]; 2] {
    [[0.0, 1.0], [1.0, 0.0]]
}

fn default_costs() -> [f64; 2] {
    [1.0, 1.0]
}

fn default_evidence_seed() -> u64 {
    12345
}

fn default_shortlist_size() -> usize {
    10
}

fn default_one() -> f64 {
    1.0
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}
