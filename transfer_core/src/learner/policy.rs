//! Common surface of the selection policies.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::error::{ActiveError, ActiveResult};
use super::partition::Partition;
use crate::data::DataSet;
use crate::model::Marginals;

/// Direction of a policy's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    Maximize,
    Minimize,
}

impl Objective {
    /// Strict improvement; `NaN` never improves.
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Objective::Maximize => candidate > best,
            Objective::Minimize => candidate < best,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Objective::Maximize => Objective::Minimize,
            Objective::Minimize => Objective::Maximize,
        }
    }
}

/// Index chosen by a policy and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub value: f64,
}

/// Best-scoring candidate in iteration order.
///
/// A later candidate replaces the current best only on strict improvement,
/// so ties go to the first one seen. `NaN` scores are skipped; if every score
/// is `NaN` the first candidate is returned.
pub fn select_best<I>(objective: Objective, scores: I) -> Option<Selection>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut first: Option<Selection> = None;
    let mut best: Option<Selection> = None;

    for (index, value) in scores {
        if first.is_none() {
            first = Some(Selection { index, value });
        }
        if value.is_nan() {
            continue;
        }
        match best {
            Some(current) if !objective.improves(value, current.value) => {}
            _ => best = Some(Selection { index, value }),
        }
    }

    best.or(first)
}

/// Per-resident state owned by every policy.
#[derive(Debug, Clone)]
pub struct ActiveState {
    data: DataSet,
    partition: Partition,
    beliefs: Option<Marginals>,
}

impl ActiveState {
    /// State over a single-resident data set, everything unlabelled.
    pub fn new(data: DataSet) -> ActiveResult<Self> {
        if data.num_residents() != 1 {
            return Err(ActiveError::invalid_parameter(
                "residents",
                data.num_residents(),
                "exactly one resident per policy",
            ));
        }
        let partition = Partition::new(data.num_examples(0));
        Ok(Self {
            data,
            partition,
            beliefs: None,
        })
    }

    pub fn data(&self) -> &DataSet {
        &self.data
    }

    /// True labels of the resident's examples.
    pub fn labels(&self) -> &[bool] {
        self.data.labels(0)
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn partition_mut(&mut self) -> &mut Partition {
        &mut self.partition
    }

    /// Replace the partition; it must cover the same pool.
    pub fn set_partition(&mut self, partition: Partition) -> ActiveResult<()> {
        if partition.len() != self.partition.len() {
            return Err(ActiveError::dimension_mismatch(
                self.partition.len(),
                partition.len(),
                "partition",
            ));
        }
        self.partition = partition;
        Ok(())
    }

    pub fn beliefs(&self) -> Option<&Marginals> {
        self.beliefs.as_ref()
    }

    pub fn set_beliefs(&mut self, beliefs: Marginals) {
        self.beliefs = Some(beliefs);
    }

    /// Unlabelled indices in ascending order, after checking the pool is
    /// non-empty and the probabilities cover it.
    pub fn candidates(&self, probabilities: &[f64]) -> ActiveResult<Vec<usize>> {
        if probabilities.len() != self.partition.len() {
            return Err(ActiveError::dimension_mismatch(
                self.partition.len(),
                probabilities.len(),
                "probabilities",
            ));
        }
        if self.partition.is_exhausted() {
            return Err(ActiveError::EmptyUnlabeledPool);
        }
        Ok(self.partition.unlabeled().iter().copied().collect())
    }
}

/// Trait for strategies that choose the next example to label
pub trait SelectionPolicy: Send {
    /// Short label used in reports
    fn name(&self) -> &str;

    fn objective(&self) -> Objective;

    fn state(&self) -> &ActiveState;

    fn state_mut(&mut self) -> &mut ActiveState;

    /// Score every unlabelled example and pick the best under
    /// [`Self::objective`]. Must not change the partition or labels.
    fn arg_max_voi(&mut self, probabilities: &[f64], priors: &Marginals) -> ActiveResult<Selection>;

    fn set_belief_state(&mut self, priors: Marginals) {
        self.state_mut().set_beliefs(priors);
    }

    /// [`Self::arg_max_voi`] against the stored belief state.
    fn select(&mut self, probabilities: &[f64]) -> ActiveResult<Selection> {
        let beliefs = self
            .state()
            .beliefs()
            .cloned()
            .ok_or(ActiveError::MissingBeliefState)?;
        self.arg_max_voi(probabilities, &beliefs)
    }

    /// Record that `index` has been labelled.
    fn update_model(&mut self, index: usize) -> ActiveResult<()> {
        self.state_mut().partition_mut().move_to_labeled(index)
    }

    /// Label up to `count_per_class` examples of each class before selection
    /// starts.
    fn transfer_seed(&mut self, count_per_class: usize, seed: u64) -> ActiveResult<Vec<usize>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = self.state_mut();
        let labels = state.data.labels(0).to_vec();
        state.partition.transfer_seed(&labels, count_per_class, &mut rng)
    }

    fn partition(&self) -> &Partition {
        self.state().partition()
    }

    fn is_exhausted(&self) -> bool {
        self.state().partition().is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_best_first_strict_improvement() {
        let scores = vec![(0, 1.0), (1, 3.0), (2, 3.0), (3, 2.0)];
        let max = select_best(Objective::Maximize, scores.clone()).unwrap();
        assert_eq!(max.index, 1);
        let min = select_best(Objective::Minimize, scores).unwrap();
        assert_eq!(min.index, 0);
    }

    #[test]
    fn test_select_best_skips_nan() {
        let scores = vec![(4, f64::NAN), (5, -1.0), (6, f64::NAN)];
        assert_eq!(select_best(Objective::Minimize, scores).unwrap().index, 5);

        let all_nan = vec![(7, f64::NAN), (8, f64::NAN)];
        assert_eq!(select_best(Objective::Maximize, all_nan).unwrap().index, 7);
        assert!(select_best(Objective::Maximize, Vec::new()).is_none());
    }

    #[test]
    fn test_state_requires_single_resident() {
        let two = DataSet::new(vec![vec![], vec![]], vec![vec![], vec![]]).unwrap();
        assert!(ActiveState::new(two).is_err());
    }

    #[test]
    fn test_candidates_checks_pool() {
        let data = DataSet::new(vec![vec![vec![1.0], vec![2.0]]], vec![vec![true, false]]).unwrap();
        let mut state = ActiveState::new(data).unwrap();
        assert_eq!(state.candidates(&[0.5, 0.5]).unwrap(), vec![0, 1]);
        assert!(matches!(
            state.candidates(&[0.5]),
            Err(ActiveError::DimensionMismatch { .. })
        ));

        state.set_partition(Partition::from_labeled(2, [0, 1]).unwrap()).unwrap();
        assert!(state.candidates(&[0.5, 0.5]).unwrap_err().is_exhausted());
    }
}
