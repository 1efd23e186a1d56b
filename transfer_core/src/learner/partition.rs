//! Labelled / unlabelled partition of one resident's examples.
//!
//! The two sets are disjoint and together cover `0..len` at all times.
//! Indices only ever move from unlabelled to labelled. Hypothesis evaluation
//! works on a copy from [`Partition::with_labeled`] instead of mutating the
//! live partition.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::error::{ActiveError, ActiveResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    len: usize,
    labeled: BTreeSet<usize>,
    unlabeled: BTreeSet<usize>,
}

impl Partition {
    /// Everything unlabelled.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            labeled: BTreeSet::new(),
            unlabeled: (0..len).collect(),
        }
    }

    /// Partition with the given indices already labelled.
    pub fn from_labeled<I: IntoIterator<Item = usize>>(len: usize, labeled: I) -> ActiveResult<Self> {
        let mut partition = Self::new(len);
        for index in labeled {
            partition.move_to_labeled(index)?;
        }
        Ok(partition)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Labelled indices in ascending order.
    pub fn labeled(&self) -> &BTreeSet<usize> {
        &self.labeled
    }

    /// Unlabelled indices in ascending order.
    pub fn unlabeled(&self) -> &BTreeSet<usize> {
        &self.unlabeled
    }

    pub fn is_labeled(&self, index: usize) -> bool {
        self.labeled.contains(&index)
    }

    /// No unlabelled examples remain.
    pub fn is_exhausted(&self) -> bool {
        self.unlabeled.is_empty()
    }

    pub fn move_to_labeled(&mut self, index: usize) -> ActiveResult<()> {
        if index >= self.len {
            return Err(ActiveError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        if self.labeled.contains(&index) {
            return Err(ActiveError::AlreadyLabeled { index });
        }
        self.unlabeled.remove(&index);
        self.labeled.insert(index);
        Ok(())
    }

    /// Copy of this partition with `index` labelled.
    pub fn with_labeled(&self, index: usize) -> ActiveResult<Self> {
        let mut copy = self.clone();
        copy.move_to_labeled(index)?;
        Ok(copy)
    }

    /// Seed the labelled set so both classes are represented.
    ///
    /// For class `false` then class `true`, `count_per_class` times: shuffle
    /// the unlabelled indices and move the first whose label matches. A class
    /// with fewer examples than requested contributes what it has. Returns the
    /// moved indices in the order they were moved.
    pub fn transfer_seed(
        &mut self,
        labels: &[bool],
        count_per_class: usize,
        rng: &mut StdRng,
    ) -> ActiveResult<Vec<usize>> {
        if labels.len() != self.len {
            return Err(ActiveError::dimension_mismatch(
                self.len,
                labels.len(),
                "transfer seed labels",
            ));
        }

        let mut moved = Vec::new();
        for class in [false, true] {
            for _ in 0..count_per_class {
                let mut order: Vec<usize> = self.unlabeled.iter().copied().collect();
                order.shuffle(rng);
                match order.into_iter().find(|&i| labels[i] == class) {
                    Some(index) => {
                        self.move_to_labeled(index)?;
                        moved.push(index);
                    }
                    None => break,
                }
            }
        }
        Ok(moved)
    }

    /// Disjoint and exhaustive over `0..len`.
    pub fn is_consistent(&self) -> bool {
        self.labeled.is_disjoint(&self.unlabeled)
            && self.labeled.len() + self.unlabeled.len() == self.len
            && self
                .labeled
                .iter()
                .chain(self.unlabeled.iter())
                .all(|&i| i < self.len)
    }
}
