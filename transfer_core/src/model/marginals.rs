//! Belief state over classifier weights.
//!
//! Every component is a plain value, so `Clone` is a deep copy and two
//! `Marginals` never share a distribution.

use serde::{Deserialize, Serialize};

use super::distributions::{Gamma, Gaussian};
use super::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marginals {
    /// Community mean of each weight
    pub weight_means: Vec<Gaussian>,
    /// Community precision of each weight
    pub weight_precisions: Vec<Gamma>,
    /// Per-resident weight posteriors, filled in by training
    pub weights: Option<Vec<Vec<Gaussian>>>,
}

impl Marginals {
    pub fn new(weight_means: Vec<Gaussian>, weight_precisions: Vec<Gamma>) -> ModelResult<Self> {
        let marginals = Self {
            weight_means,
            weight_precisions,
            weights: None,
        };
        marginals.validate()?;
        Ok(marginals)
    }

    /// Identical prior on every feature.
    pub fn isotropic(num_features: usize, mean: Gaussian, precision: Gamma) -> Self {
        Self {
            weight_means: vec![mean; num_features],
            weight_precisions: vec![precision; num_features],
            weights: None,
        }
    }

    pub fn num_features(&self) -> usize {
        self.weight_means.len()
    }

    /// Check lengths agree and every distribution is proper.
    pub fn validate(&self) -> ModelResult<()> {
        if self.weight_means.len() != self.weight_precisions.len() {
            return Err(ModelError::dimension_mismatch(
                self.weight_means.len(),
                self.weight_precisions.len(),
                "weight precisions",
            ));
        }
        if let Some(f) = self.weight_means.iter().position(|g| !g.is_proper()) {
            return Err(ModelError::improper(format!("weight mean {}", f)));
        }
        if let Some(f) = self.weight_precisions.iter().position(|g| !g.is_proper()) {
            return Err(ModelError::improper(format!("weight precision {}", f)));
        }
        Ok(())
    }

    /// Gaussian prior over a single resident's weights, integrating the
    /// community mean and plugging in the expected precision.
    pub fn resident_prior(&self) -> Vec<Gaussian> {
        self.weight_means
            .iter()
            .zip(&self.weight_precisions)
            .map(|(mean, precision)| {
                Gaussian::new(mean.mean, mean.variance + precision.mean_reciprocal())
            })
            .collect()
    }

    /// Copy without the per-resident posteriors.
    pub fn community(&self) -> Self {
        Self {
            weight_means: self.weight_means.clone(),
            weight_precisions: self.weight_precisions.clone(),
            weights: None,
        }
    }
}
