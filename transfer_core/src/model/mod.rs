//! Probabilistic binary classifier
//!
//! The selection policies only see the classifier through
//! [`ProbabilisticClassifier`]: every call takes the data and a belief state
//! and returns a new value, so the same instance can be shared across threads
//! while candidate hypotheses are evaluated.

pub mod binary;
pub mod distributions;
pub mod error;
pub mod marginals;

pub use binary::{BinaryModel, BinaryModelConfig};
pub use distributions::{Bernoulli, Gamma, Gaussian};
pub use error::{ModelError, ModelResult};
pub use marginals::Marginals;

use crate::data::DataSet;

/// Trait for classifiers with Bayesian belief state over their weights
pub trait ProbabilisticClassifier: Send + Sync {
    /// Infer posterior beliefs from labelled data, starting at `priors`.
    ///
    /// Fails with [`ModelError::ImproperBelief`] when inference cannot
    /// produce a normalisable distribution.
    fn train(
        &self,
        dataset: &DataSet,
        priors: &Marginals,
        iterations: usize,
    ) -> ModelResult<Marginals>;

    /// Predictive label distribution for every example, indexed
    /// `[resident][example]`. Labels in `dataset` are ignored.
    fn predict(&self, dataset: &DataSet, priors: &Marginals) -> ModelResult<Vec<Vec<Bernoulli>>>;

    /// Model evidence of the labelled data under `priors`; the log odds of
    /// the returned value is the log marginal likelihood.
    fn compute_evidence(&self, dataset: &DataSet, priors: &Marginals) -> ModelResult<Bernoulli>;

    /// Predicted probability of `true` for each example of one resident.
    fn predict_probabilities(
        &self,
        dataset: &DataSet,
        priors: &Marginals,
        resident: usize,
    ) -> ModelResult<Vec<f64>> {
        let predictions = self.predict(dataset, priors)?;
        let row = predictions
            .get(resident)
            .ok_or_else(|| ModelError::empty(format!("prediction for resident {}", resident)))?;
        Ok(row.iter().map(Bernoulli::prob_true).collect())
    }
}
