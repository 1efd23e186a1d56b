//! Value-of-information selection.
//!
//! For every unlabelled candidate `i` with current probability `p`, the
//! classifier is retrained on the candidate under each hypothesised label,
//! the whole pool is re-predicted, and the total risk of the hypothetical
//! partition is recorded. The candidate's value is
//!
//! ```text
//! VOI(i) = TotalRisk - (Risk_true * (1 - p) + Risk_false * p) - QueryCost(p)
//! ```
//!
//! Each candidate is evaluated on its own [`Hypothesis`] snapshot, so the
//! candidates are scored in parallel and the live state is never touched.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::ActiveResult;
use super::hypothesis::{retrain_or_prior, Hypothesis};
use super::policy::{select_best, ActiveState, Objective, Selection, SelectionPolicy};
use super::risk::RiskObjective;
use crate::data::DataSet;
use crate::model::{Marginals, ProbabilisticClassifier};

/// Sweeps used when retraining on a single hypothesised label.
pub const DEFAULT_HYPOTHESIS_ITERATIONS: usize = 1;

/// Breakdown of one candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateEstimate {
    pub index: usize,
    pub probability: f64,
    pub risk_if_true: f64,
    pub risk_if_false: f64,
    pub value: f64,
}

pub struct VoiPolicy<C: ProbabilisticClassifier + ?Sized> {
    state: ActiveState,
    classifier: Arc<C>,
    risk: RiskObjective,
    objective: Objective,
    hypothesis_iterations: usize,
}

impl<C: ProbabilisticClassifier + ?Sized> VoiPolicy<C> {
    pub fn new(
        data: DataSet,
        classifier: Arc<C>,
        risk: RiskObjective,
        reversed: bool,
    ) -> ActiveResult<Self> {
        let objective = if reversed {
            Objective::Minimize
        } else {
            Objective::Maximize
        };
        Ok(Self {
            state: ActiveState::new(data)?,
            classifier,
            risk,
            objective,
            hypothesis_iterations: DEFAULT_HYPOTHESIS_ITERATIONS,
        })
    }

    pub fn with_hypothesis_iterations(mut self, iterations: usize) -> Self {
        self.hypothesis_iterations = iterations.max(1);
        self
    }

    pub fn risk(&self) -> &RiskObjective {
        &self.risk
    }

    /// Total risk of the live partition under `probabilities`.
    pub fn current_risk(&self, probabilities: &[f64]) -> ActiveResult<f64> {
        self.risk
            .total_risk(self.state.partition(), self.state.labels(), probabilities)
    }

    /// Score every unlabelled candidate, in ascending index order.
    pub fn estimate_candidates(
        &self,
        probabilities: &[f64],
        priors: &Marginals,
    ) -> ActiveResult<Vec<CandidateEstimate>> {
        let candidates = self.state.candidates(probabilities)?;
        let current = self.current_risk(probabilities)?;

        let state = &self.state;
        let classifier = self.classifier.as_ref();
        let risk = &self.risk;
        let iterations = self.hypothesis_iterations;

        candidates
            .par_iter()
            .map(|&index| {
                let p = probabilities[index];
                let risk_if_true =
                    hypothetical_risk(state, classifier, risk, priors, index, true, iterations)?;
                let risk_if_false =
                    hypothetical_risk(state, classifier, risk, priors, index, false, iterations)?;
                Ok(CandidateEstimate {
                    index,
                    probability: p,
                    risk_if_true,
                    risk_if_false,
                    value: risk.value_of_information(current, risk_if_true, risk_if_false, p),
                })
            })
            .collect()
    }
}

fn hypothetical_risk<C: ProbabilisticClassifier + ?Sized>(
    state: &ActiveState,
    classifier: &C,
    risk: &RiskObjective,
    priors: &Marginals,
    index: usize,
    label: bool,
    iterations: usize,
) -> ActiveResult<f64> {
    let hypothesis = Hypothesis::new(state, index, label)?;
    let example = hypothesis.example(state.data())?;
    let posterior = retrain_or_prior(classifier, &example, priors, iterations)?;
    let probabilities = classifier.predict_probabilities(state.data(), &posterior, 0)?;
    risk.total_risk(&hypothesis.partition, &hypothesis.labels, &probabilities)
}

impl<C: ProbabilisticClassifier + ?Sized> SelectionPolicy for VoiPolicy<C> {
    fn name(&self) -> &str {
        match self.objective {
            Objective::Maximize => "VOI+",
            Objective::Minimize => "VOI-",
        }
    }

    fn objective(&self) -> Objective {
        self.objective
    }

    fn state(&self) -> &ActiveState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActiveState {
        &mut self.state
    }

    fn arg_max_voi(&mut self, probabilities: &[f64], priors: &Marginals) -> ActiveResult<Selection> {
        let estimates = self.estimate_candidates(probabilities, priors)?;
        let selection = select_best(
            self.objective,
            estimates.iter().map(|e| (e.index, e.value)),
        )
        .unwrap_or(Selection {
            index: 0,
            value: f64::NAN,
        });
        tracing::debug!(
            "{} selected {} (value {:.6}) from {} candidates",
            self.name(),
            selection.index,
            selection.value,
            estimates.len()
        );
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learner::ActiveError;
    use crate::model::{BinaryModel, Gamma, Gaussian};

    fn pool() -> DataSet {
        DataSet::new(
            vec![vec![
                vec![1.0, 0.0],
                vec![0.1, 0.0],
                vec![-0.9, 0.0],
                vec![0.0, 1.0],
            ]],
            vec![vec![true, true, false, true]],
        )
        .unwrap()
    }

    fn priors() -> Marginals {
        Marginals::isotropic(2, Gaussian::standard(), Gamma::default())
    }

    fn policy(reversed: bool) -> VoiPolicy<BinaryModel> {
        VoiPolicy::new(
            pool(),
            Arc::new(BinaryModel::default()),
            RiskObjective::default(),
            reversed,
        )
        .unwrap()
    }

    #[test]
    fn test_estimates_cover_unlabeled_in_order() {
        let mut policy = policy(false);
        policy.update_model(2).unwrap();
        let probs = [0.6, 0.5, 0.3, 0.5];
        let estimates = policy.estimate_candidates(&probs, &priors()).unwrap();
        let indices: Vec<usize> = estimates.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
        assert!(estimates.iter().all(|e| e.value.is_finite()));
    }

    #[test]
    fn test_value_matches_formula() {
        let policy = policy(false);
        let probs = [0.7, 0.5, 0.2, 0.5];
        let current = policy.current_risk(&probs).unwrap();
        for e in policy.estimate_candidates(&probs, &priors()).unwrap() {
            let expected = current
                - (e.risk_if_true * (1.0 - e.probability) + e.risk_if_false * e.probability)
                - policy.risk().query_cost(e.probability);
            assert!((e.value - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reversed_picks_minimum() {
        let probs = [0.7, 0.5, 0.2, 0.5];
        let mut forward = policy(false);
        let mut reversed = policy(true);
        assert_eq!(forward.name(), "VOI+");
        assert_eq!(reversed.name(), "VOI-");

        let estimates = forward.estimate_candidates(&probs, &priors()).unwrap();
        let max = forward.arg_max_voi(&probs, &priors()).unwrap();
        let min = reversed.arg_max_voi(&probs, &priors()).unwrap();
        assert!(estimates.iter().all(|e| e.value <= max.value));
        assert!(estimates.iter().all(|e| e.value >= min.value));
    }

    #[test]
    fn test_arg_max_voi_leaves_state_untouched() {
        let mut policy = policy(false);
        policy.update_model(0).unwrap();
        let before = policy.partition().clone();
        let labels = policy.state().labels().to_vec();
        let probs = [0.7, 0.5, 0.2, 0.5];

        let first = policy.arg_max_voi(&probs, &priors()).unwrap();
        let second = policy.arg_max_voi(&probs, &priors()).unwrap();
        assert_eq!(first, second);
        assert_eq!(policy.partition(), &before);
        assert_eq!(policy.state().labels(), labels.as_slice());
    }

    #[test]
    fn test_empty_pool_refused() {
        let mut policy = policy(false);
        for i in 0..4 {
            policy.update_model(i).unwrap();
        }
        assert!(matches!(
            policy.arg_max_voi(&[0.5; 4], &priors()),
            Err(ActiveError::EmptyUnlabeledPool)
        ));
    }
}
