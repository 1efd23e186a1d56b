//! Evidence-based selection.
//!
//! Works on a shortlist of the most uncertain unlabelled examples. For each
//! shortlisted candidate and each hypothesised label, model evidence of the
//! labelled set plus the candidate is computed under the priors and under the
//! hypothetical posterior. The candidate whose combined evidence ratio is
//! closest to 1 wins.

use std::cmp::Ordering;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::error::ActiveResult;
use super::hypothesis::{retrain_or_prior, Hypothesis};
use super::policy::{select_best, ActiveState, Objective, Selection, SelectionPolicy};
use crate::data::DataSet;
use crate::model::{Bernoulli, Marginals, ProbabilisticClassifier};

pub const DEFAULT_SHORTLIST_SIZE: usize = 10;
pub const DEFAULT_EVIDENCE_SEED: u64 = 12345;

/// Positive-over-negative evidence ratios for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRatios {
    pub prior: f64,
    pub posterior: f64,
    pub combined: f64,
}

impl EvidenceRatios {
    fn from_evidence(
        pos_prior: Bernoulli,
        neg_prior: Bernoulli,
        pos_post: Bernoulli,
        neg_post: Bernoulli,
    ) -> Self {
        Self {
            prior: pos_prior.log_odds() / neg_prior.log_odds(),
            posterior: pos_post.log_odds() / neg_post.log_odds(),
            combined: (pos_prior.log_odds() + pos_post.log_prob_true())
                / (neg_prior.log_odds() + neg_post.log_prob_true()),
        }
    }

    /// `max(c, 1/c)` of the combined ratio; 1 is the most ambiguous.
    pub fn score(&self) -> f64 {
        self.combined.max(1.0 / self.combined)
    }
}

pub struct EvidencePolicy<C: ProbabilisticClassifier + ?Sized> {
    state: ActiveState,
    classifier: Arc<C>,
    reversed: bool,
    shortlist_size: usize,
    hypothesis_iterations: usize,
    rng: StdRng,
}

impl<C: ProbabilisticClassifier + ?Sized> EvidencePolicy<C> {
    pub fn new(data: DataSet, classifier: Arc<C>, reversed: bool) -> ActiveResult<Self> {
        Ok(Self {
            state: ActiveState::new(data)?,
            classifier,
            reversed,
            shortlist_size: DEFAULT_SHORTLIST_SIZE,
            hypothesis_iterations: 1,
            rng: StdRng::seed_from_u64(DEFAULT_EVIDENCE_SEED),
        })
    }

    pub fn with_shortlist_size(mut self, size: usize) -> Self {
        self.shortlist_size = size.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_hypothesis_iterations(mut self, iterations: usize) -> Self {
        self.hypothesis_iterations = iterations.max(1);
        self
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// The most uncertain unlabelled indices under `priors`, shuffled before
    /// a stable sort so equal uncertainties come out in random order.
    pub fn shortlist(&mut self, priors: &Marginals) -> ActiveResult<Vec<usize>> {
        let probabilities = self
            .classifier
            .predict_probabilities(self.state.data(), priors, 0)?;
        let mut candidates = self.state.candidates(&probabilities)?;
        candidates.shuffle(&mut self.rng);
        candidates.sort_by(|&a, &b| {
            let ua = (probabilities[a] - 0.5).abs();
            let ub = (probabilities[b] - 0.5).abs();
            ua.partial_cmp(&ub).unwrap_or(Ordering::Equal)
        });
        candidates.truncate(self.shortlist_size);
        Ok(candidates)
    }

    /// Evidence ratios for labelling `index` positive versus negative.
    pub fn evidence_ratios(&self, index: usize, priors: &Marginals) -> ActiveResult<EvidenceRatios> {
        let (pos_prior, pos_post) = self.hypothetical_evidence(index, true, priors)?;
        let (neg_prior, neg_post) = self.hypothetical_evidence(index, false, priors)?;
        Ok(EvidenceRatios::from_evidence(
            pos_prior, neg_prior, pos_post, neg_post,
        ))
    }

    fn hypothetical_evidence(
        &self,
        index: usize,
        label: bool,
        priors: &Marginals,
    ) -> ActiveResult<(Bernoulli, Bernoulli)> {
        let data = self.state.data();
        let hypothesis = Hypothesis::new(&self.state, index, label)?;
        let posterior = if self.reversed {
            priors.clone()
        } else {
            let example = hypothesis.example(data)?;
            retrain_or_prior(
                self.classifier.as_ref(),
                &example,
                priors,
                self.hypothesis_iterations,
            )?
        };

        let labeled = hypothesis.labeled_examples(data)?;
        let under_prior = self.classifier.compute_evidence(&labeled, priors)?;
        let under_posterior = self.classifier.compute_evidence(&labeled, &posterior)?;
        Ok((under_prior, under_posterior))
    }
}

impl<C: ProbabilisticClassifier + ?Sized> SelectionPolicy for EvidencePolicy<C> {
    fn name(&self) -> &str {
        if self.reversed {
            "ActEv-"
        } else {
            "ActEv+"
        }
    }

    fn objective(&self) -> Objective {
        Objective::Minimize
    }

    fn state(&self) -> &ActiveState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActiveState {
        &mut self.state
    }

    fn arg_max_voi(&mut self, probabilities: &[f64], priors: &Marginals) -> ActiveResult<Selection> {
        // validates length and pool before any inference
        self.state.candidates(probabilities)?;

        let shortlist = self.shortlist(priors)?;
        let mut scores = Vec::with_capacity(shortlist.len());
        for &index in &shortlist {
            let ratios = self.evidence_ratios(index, priors)?;
            tracing::debug!(
                "{} candidate {}: prior {:.4} posterior {:.4} combined {:.4}",
                self.name(),
                index,
                ratios.prior,
                ratios.posterior,
                ratios.combined
            );
            scores.push((index, ratios.score()));
        }

        Ok(select_best(Objective::Minimize, scores).unwrap_or(Selection {
            index: shortlist.first().copied().unwrap_or_default(),
            value: f64::NAN,
        }))
    }
}
