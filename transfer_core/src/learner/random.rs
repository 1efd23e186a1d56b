//! Uniform random selection baseline.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::ActiveResult;
use super::policy::{ActiveState, Objective, Selection, SelectionPolicy};
use crate::data::DataSet;
use crate::model::Marginals;

pub struct RandomPolicy {
    state: ActiveState,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(data: DataSet, seed: u64) -> ActiveResult<Self> {
        Ok(Self {
            state: ActiveState::new(data)?,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl SelectionPolicy for RandomPolicy {
    fn name(&self) -> &str {
        "Random"
    }

    fn objective(&self) -> Objective {
        Objective::Maximize
    }

    fn state(&self) -> &ActiveState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActiveState {
        &mut self.state
    }

    fn arg_max_voi(&mut self, probabilities: &[f64], _priors: &Marginals) -> ActiveResult<Selection> {
        let candidates = self.state.candidates(probabilities)?;
        let index = candidates[self.rng.gen_range(0..candidates.len())];
        Ok(Selection { index, value: 0.0 })
    }
}
