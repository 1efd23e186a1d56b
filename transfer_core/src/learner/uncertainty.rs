//! Uncertainty and certainty sampling.
//!
//! Scores each unlabelled example by `|0.5 - p|`. The forward policy takes
//! the smallest distance (most uncertain); the reversed policy takes the
//! largest (most certain).

use super::error::ActiveResult;
use super::policy::{select_best, ActiveState, Objective, Selection, SelectionPolicy};
use crate::data::DataSet;
use crate::model::Marginals;

pub struct UncertaintyPolicy {
    state: ActiveState,
    objective: Objective,
}

impl UncertaintyPolicy {
    pub fn new(data: DataSet, reversed: bool) -> ActiveResult<Self> {
        let objective = if reversed {
            Objective::Maximize
        } else {
            Objective::Minimize
        };
        Ok(Self {
            state: ActiveState::new(data)?,
            objective,
        })
    }

    pub fn is_reversed(&self) -> bool {
        self.objective == Objective::Maximize
    }
}

impl SelectionPolicy for UncertaintyPolicy {
    fn name(&self) -> &str {
        if self.is_reversed() {
            "CS"
        } else {
            "US"
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

    fn arg_max_voi(&mut self, probabilities: &[f64], _priors: &Marginals) -> ActiveResult<Selection> {
        let candidates = self.state.candidates(probabilities)?;
        let scores = candidates
            .into_iter()
            .map(|i| (i, (0.5 - probabilities[i]).abs()));
        // candidates is non-empty, so a selection always exists
        Ok(select_best(self.objective, scores).unwrap_or(Selection {
            index: 0,
            value: f64::NAN,
        }))
    }
}
