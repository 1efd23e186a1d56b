//! Batch, online and active experiment protocols.
//!
//! Every protocol takes the priors and data explicitly and stores the
//! resulting posteriors and metrics on the [`Experiment`]. The active loop
//! runs, per resident: predict, select, label, retrain, stopping early when
//! the unlabelled pool is empty.

use std::fmt;
use std::sync::Arc;

use active_transfer_shared::{HoldoutMetricsCollection, Metrics, MetricsCollection};
use serde::{Deserialize, Serialize};

use crate::config::{ExperimentConfig, RunConfig};
use crate::data::DataSet;
use crate::learner::{
    ActiveError, ActiveResult, EvidencePolicy, RandomPolicy, SelectionPolicy, UncertaintyPolicy,
    VoiPolicy,
};
use crate::logging::{
    log_experiment_summary, timestamp_ms, ExperimentSummary, SelectionJournal, SelectionLogEntry,
};
use crate::model::{Marginals, ModelResult, ProbabilisticClassifier};

/// Selection strategy of a family of learners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearnerKind {
    Random,
    Uncertainty,
    Certainty,
    Voi,
    VoiReversed,
    Evidence,
    EvidenceReversed,
}

impl LearnerKind {
    pub const ALL: [LearnerKind; 7] = [
        LearnerKind::Random,
        LearnerKind::Uncertainty,
        LearnerKind::Certainty,
        LearnerKind::Voi,
        LearnerKind::VoiReversed,
        LearnerKind::Evidence,
        LearnerKind::EvidenceReversed,
    ];

    /// Label used in reports and journals.
    pub fn label(self) -> &'static str {
        match self {
            LearnerKind::Random => "Random",
            LearnerKind::Uncertainty => "US",
            LearnerKind::Certainty => "CS",
            LearnerKind::Voi => "VOI+",
            LearnerKind::VoiReversed => "VOI-",
            LearnerKind::Evidence => "ActEv+",
            LearnerKind::EvidenceReversed => "ActEv-",
        }
    }
}

impl fmt::Display for LearnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One policy of `kind` per resident, each owning that resident's data.
pub fn create_learners<C>(
    kind: LearnerKind,
    dataset: &DataSet,
    classifier: Arc<C>,
    config: &ExperimentConfig,
) -> ActiveResult<Vec<Box<dyn SelectionPolicy>>>
where
    C: ProbabilisticClassifier + ?Sized + 'static,
{
    let hypothesis_iterations = config.experiment.hypothesis_iterations;
    let policy = &config.policy;

    (0..dataset.num_residents())
        .map(|r| {
            let data = dataset.resident_subset(r)?;
            let learner: Box<dyn SelectionPolicy> = match kind {
                LearnerKind::Random => Box::new(RandomPolicy::new(
                    data,
                    policy.random_seed.wrapping_add(r as u64),
                )?),
                LearnerKind::Uncertainty => Box::new(UncertaintyPolicy::new(data, false)?),
                LearnerKind::Certainty => Box::new(UncertaintyPolicy::new(data, true)?),
                LearnerKind::Voi | LearnerKind::VoiReversed => Box::new(
                    VoiPolicy::new(
                        data,
                        Arc::clone(&classifier),
                        config.risk,
                        kind == LearnerKind::VoiReversed,
                    )?
                    .with_hypothesis_iterations(hypothesis_iterations),
                ),
                LearnerKind::Evidence | LearnerKind::EvidenceReversed => Box::new(
                    EvidencePolicy::new(
                        data,
                        Arc::clone(&classifier),
                        kind == LearnerKind::EvidenceReversed,
                    )?
                    .with_shortlist_size(policy.shortlist_size)
                    .with_seed(policy.evidence_seed)
                    .with_hypothesis_iterations(hypothesis_iterations),
                ),
            };
            Ok(learner)
        })
        .collect()
}

pub struct Experiment<C: ProbabilisticClassifier + ?Sized> {
    name: String,
    classifier: Arc<C>,
    config: RunConfig,
    transfer_seed: u64,
    posteriors: Option<Marginals>,
    individual_posteriors: Vec<Marginals>,
    metrics: MetricsCollection,
    holdout_metrics: HoldoutMetricsCollection,
    journal: SelectionJournal,
}

impl<C: ProbabilisticClassifier + ?Sized> Experiment<C> {
    pub fn new(name: impl Into<String>, classifier: Arc<C>, config: &ExperimentConfig) -> Self {
        Self {
            name: name.into(),
            classifier,
            config: config.experiment.clone(),
            transfer_seed: config.policy.transfer_seed,
            posteriors: None,
            individual_posteriors: Vec::new(),
            metrics: MetricsCollection::new(),
            holdout_metrics: HoldoutMetricsCollection::default(),
            journal: SelectionJournal::new(config.experiment.journal),
        }
    }

    /// Replace the run journal, e.g. to persist somewhere other than `logs/`.
    pub fn with_journal(mut self, journal: SelectionJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Posterior from the last batch run.
    pub fn posteriors(&self) -> Option<&Marginals> {
        self.posteriors.as_ref()
    }

    /// Final per-resident posteriors from the last online or active run.
    pub fn individual_posteriors(&self) -> &[Marginals] {
        &self.individual_posteriors
    }

    pub fn metrics(&self) -> &MetricsCollection {
        &self.metrics
    }

    pub fn holdout_metrics(&self) -> &HoldoutMetricsCollection {
        &self.holdout_metrics
    }

    pub fn journal(&self) -> &SelectionJournal {
        &self.journal
    }

    /// Train on every resident at once.
    pub fn run_batch(&mut self, dataset: &DataSet, priors: &Marginals) -> ActiveResult<&Marginals> {
        tracing::info!(
            "{}: batch training on {} residents ({} examples)",
            self.name,
            dataset.num_residents(),
            dataset.total_examples()
        );
        let posteriors = self
            .classifier
            .train(dataset, priors, self.config.train_iterations)?;
        Ok(&*self.posteriors.insert(posteriors))
    }

    /// Present each resident's examples one at a time: predict the example
    /// and the holdout set, then train on the example.
    pub fn run_online(
        &mut self,
        dataset: &DataSet,
        holdout: &DataSet,
        priors: &Marginals,
    ) -> ActiveResult<()> {
        check_residents(dataset, holdout)?;
        self.reset(dataset.num_residents());

        for r in 0..dataset.num_residents() {
            let holdout_data = holdout.resident_subset(r)?;
            let mut posterior = priors.clone();
            let mut online = Metrics::new(self.name.clone());

            for j in 0..dataset.num_examples(r) {
                let datum = dataset.subset(r, &[j])?;
                let p = self.classifier.predict_probabilities(&datum, &posterior, 0)?;
                online.push(dataset.labels(r)[j], p[0]);

                let holdout_probs = self
                    .classifier
                    .predict_probabilities(&holdout_data, &posterior, 0)?;
                self.holdout_metrics.record(
                    r,
                    Metrics::from_labels(self.name.clone(), holdout.labels(r), &holdout_probs),
                );

                posterior = self.retrain(&datum, posterior, self.config.train_iterations)?;
            }

            tracing::info!(
                "{:>20}, Resident {}, Hold out accuracy {:.2}",
                self.name,
                r,
                mean_accuracy(&self.holdout_metrics.rounds()[r])
            );
            self.metrics.add(online);
            self.individual_posteriors.push(posterior);
        }

        self.metrics.recompute_aggregate();
        self.holdout_metrics.recompute_aggregate();
        Ok(())
    }

    /// Active loop over `steps` rounds per resident using one learner per
    /// resident.
    pub fn run_active(
        &mut self,
        dataset: &DataSet,
        holdout: &DataSet,
        steps: usize,
        priors: &Marginals,
        learners: &mut [Box<dyn SelectionPolicy>],
    ) -> ActiveResult<()> {
        check_residents(dataset, holdout)?;
        if learners.len() != dataset.num_residents() {
            return Err(ActiveError::dimension_mismatch(
                dataset.num_residents(),
                learners.len(),
                "active learners",
            ));
        }
        self.reset(dataset.num_residents());

        for (r, learner) in learners.iter_mut().enumerate() {
            let resident_data = dataset.resident_subset(r)?;
            let holdout_data = holdout.resident_subset(r)?;
            let mut posterior = priors.clone();

            if self.config.seed_per_class > 0 {
                let seeded = learner.transfer_seed(self.config.seed_per_class, self.transfer_seed)?;
                tracing::info!("{}: resident {} seeded with {:?}", self.name, r, seeded);
                if !seeded.is_empty() {
                    let seed_data = resident_data.subset(0, &seeded)?;
                    posterior = self.retrain(&seed_data, posterior, self.config.update_iterations)?;
                }
            }

            for step in 0..steps {
                let probabilities = self
                    .classifier
                    .predict_probabilities(&resident_data, &posterior, 0)?;
                let holdout_probs = self
                    .classifier
                    .predict_probabilities(&holdout_data, &posterior, 0)?;

                if learner.is_exhausted() {
                    tracing::info!("{}: resident {}: Empty unlabelled set", self.name, r);
                    break;
                }

                learner.set_belief_state(posterior.clone());
                let selection = learner.arg_max_voi(&probabilities, &posterior)?;
                learner.update_model(selection.index)?;

                let datum = resident_data.subset(0, &[selection.index])?;
                posterior = self.retrain(&datum, posterior, self.config.update_iterations)?;

                let metrics =
                    Metrics::from_labels(self.name.clone(), holdout.labels(r), &holdout_probs);
                let entry = SelectionLogEntry {
                    experiment: self.name.clone(),
                    resident: r,
                    round: step,
                    index: selection.index,
                    value: selection.value,
                    labeled: learner.partition().labeled().len(),
                    unlabeled: learner.partition().unlabeled().len(),
                    holdout_accuracy: metrics.average_accuracy(),
                    timestamp_ms: timestamp_ms(),
                };
                if let Err(err) = self.journal.record(entry) {
                    tracing::warn!("{}: failed to append selection journal: {}", self.name, err);
                }
                self.holdout_metrics.record(r, metrics);
            }

            let rounds = &self.holdout_metrics.rounds()[r];
            tracing::info!(
                "{:>20}, Resident {}, Class ratio {:.2}, Hold out accuracy {:.2}, Accuracies [{}]",
                self.name,
                r,
                class_ratio(holdout.labels(r)),
                mean_accuracy(rounds),
                rounds
                    .iter()
                    .map(|m| format!("{:.2}", m.average_accuracy()))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            self.individual_posteriors.push(posterior);
        }

        self.holdout_metrics.recompute_aggregate();
        if self.journal.is_persistent() {
            if let Err(err) = log_experiment_summary(self.journal.dir(), &self.summary()) {
                tracing::warn!("{}: failed to append experiment summary: {}", self.name, err);
            }
        }
        Ok(())
    }

    /// Holdout accuracy summary of the last online or active run.
    pub fn summary(&self) -> ExperimentSummary {
        let aggregate = self.holdout_metrics.aggregate();
        ExperimentSummary {
            experiment: self.name.clone(),
            residents: self.holdout_metrics.rounds().len(),
            rounds: aggregate.len(),
            accuracy: aggregate.average_accuracy.clone(),
            final_accuracy: aggregate.average_accuracy.last().copied().unwrap_or(f64::NAN),
            timestamp_ms: timestamp_ms(),
        }
    }

    fn reset(&mut self, residents: usize) {
        self.individual_posteriors.clear();
        self.metrics = MetricsCollection::new();
        self.holdout_metrics = HoldoutMetricsCollection::new(residents);
        self.journal.clear();
    }

    /// Train from `posterior`, keeping it when inference is improper.
    fn retrain(
        &self,
        data: &DataSet,
        posterior: Marginals,
        iterations: usize,
    ) -> ModelResult<Marginals> {
        match self.classifier.train(data, &posterior, iterations) {
            Ok(updated) => Ok(updated),
            Err(err) if err.is_improper() => {
                tracing::warn!("{}: keeping previous posterior: {}", self.name, err);
                Ok(posterior)
            }
            Err(err) => Err(err),
        }
    }
}

fn check_residents(dataset: &DataSet, holdout: &DataSet) -> ActiveResult<()> {
    if dataset.num_residents() != holdout.num_residents() {
        return Err(ActiveError::dimension_mismatch(
            dataset.num_residents(),
            holdout.num_residents(),
            "holdout residents",
        ));
    }
    Ok(())
}

fn mean_accuracy(rounds: &[Metrics]) -> f64 {
    let accuracies: Vec<f64> = rounds.iter().map(Metrics::average_accuracy).collect();
    active_transfer_shared::mean(&accuracies)
}

fn class_ratio(labels: &[bool]) -> f64 {
    if labels.is_empty() {
        return f64::NAN;
    }
    labels.iter().filter(|&&l| l).count() as f64 / labels.len() as f64
}
