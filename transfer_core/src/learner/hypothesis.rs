//! What-if snapshots for counterfactual labelling.
//!
//! A [`Hypothesis`] owns copies of the partition and label vector with one
//! candidate labelled, so evaluating it never touches the live state and
//! candidates can be scored in parallel.

use super::error::ActiveResult;
use super::partition::Partition;
use super::policy::ActiveState;
use crate::data::DataSet;
use crate::model::{Marginals, ModelResult, ProbabilisticClassifier};

#[derive(Debug, Clone)]
pub struct Hypothesis {
    pub index: usize,
    pub label: bool,
    pub partition: Partition,
    pub labels: Vec<bool>,
}

impl Hypothesis {
    /// Snapshot of `state` with `index` labelled as `label`.
    pub fn new(state: &ActiveState, index: usize, label: bool) -> ActiveResult<Self> {
        let partition = state.partition().with_labeled(index)?;
        let mut labels = state.labels().to_vec();
        labels[index] = label;
        Ok(Self {
            index,
            label,
            partition,
            labels,
        })
    }

    /// The candidate alone, carrying the hypothesised label.
    pub fn example(&self, data: &DataSet) -> ActiveResult<DataSet> {
        Ok(data
            .subset(0, &[self.index])?
            .with_label(0, 0, self.label)?)
    }

    /// Every labelled example of the snapshot, in ascending index order,
    /// carrying the hypothesised label for the candidate.
    pub fn labeled_examples(&self, data: &DataSet) -> ActiveResult<DataSet> {
        let indices: Vec<usize> = self.partition.labeled().iter().copied().collect();
        let position = indices
            .iter()
            .position(|&i| i == self.index)
            .unwrap_or_default();
        Ok(data
            .subset(0, &indices)?
            .with_label(0, position, self.label)?)
    }
}

/// Train on `data`, substituting `priors` when inference is improper.
pub fn retrain_or_prior<C: ProbabilisticClassifier + ?Sized>(
    classifier: &C,
    data: &DataSet,
    priors: &Marginals,
    iterations: usize,
) -> ModelResult<Marginals> {
    match classifier.train(data, priors, iterations) {
        Ok(posterior) => Ok(posterior),
        Err(err) if err.is_improper() => {
            tracing::debug!("hypothetical retrain fell back to priors: {}", err);
            Ok(priors.clone())
        }
        Err(err) => Err(err),
    }
}
