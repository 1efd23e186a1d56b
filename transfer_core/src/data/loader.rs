//! JSON ingestion of recorded per-subject sensor data.
//!
//! The file holds three parallel arrays: `s` (subject id per row), `y`
//! (binary label) and `x` (feature row).

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::dataset::DataSet;
use super::error::{DataError, DataResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLoader {
    pub s: Vec<i64>,
    pub y: Vec<bool>,
    pub x: Vec<Vec<f64>>,
}

impl DataLoader {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DataResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> DataResult<Self> {
        let loader: DataLoader = serde_json::from_str(contents)?;
        loader.validate()?;
        Ok(loader)
    }

    fn validate(&self) -> DataResult<()> {
        if self.s.len() != self.y.len() {
            return Err(DataError::dimension_mismatch(
                self.y.len(),
                self.s.len(),
                "subject ids",
            ));
        }
        if self.x.len() != self.y.len() {
            return Err(DataError::dimension_mismatch(
                self.y.len(),
                self.x.len(),
                "feature rows",
            ));
        }
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn num_subjects(&self) -> usize {
        self.s.iter().collect::<BTreeSet<_>>().len()
    }

    /// Width of the first feature row; `0` when there are no rows.
    pub fn num_features(&self) -> usize {
        self.x.first().map_or(0, Vec::len)
    }

    /// Distinct subject ids in ascending order.
    pub fn subjects(&self) -> Vec<i64> {
        self.s.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Group rows into one resident per entry of `subjects`, in that order.
    ///
    /// Only the columns in `selected` are kept (all columns when empty); a
    /// constant `1.0` is appended when `add_bias` is set. Each resident keeps
    /// its first `round(keep_proportion * rows)` rows in file order.
    pub fn to_dataset(
        &self,
        subjects: &[i64],
        add_bias: bool,
        selected: &BTreeSet<usize>,
        keep_proportion: f64,
    ) -> DataResult<DataSet> {
        if !(0.0..=1.0).contains(&keep_proportion) {
            return Err(DataError::invalid_parameter(
                "keep_proportion",
                keep_proportion,
                "0 <= keep_proportion <= 1",
            ));
        }
        if let Some(&column) = selected.iter().find(|&&c| c >= self.num_features()) {
            return Err(DataError::index_out_of_range(
                column,
                self.num_features(),
                "selected features",
            ));
        }

        let slots: HashMap<i64, usize> = subjects
            .iter()
            .enumerate()
            .map(|(slot, &subject)| (subject, slot))
            .collect();

        let mut features: Vec<Vec<Vec<f64>>> = vec![Vec::new(); subjects.len()];
        let mut labels: Vec<Vec<bool>> = vec![Vec::new(); subjects.len()];

        for ((subject, &label), row) in self.s.iter().zip(&self.y).zip(&self.x) {
            let Some(&slot) = slots.get(subject) else {
                continue;
            };
            let mut kept: Vec<f64> = row
                .iter()
                .enumerate()
                .filter(|(column, _)| selected.is_empty() || selected.contains(column))
                .map(|(_, &value)| value)
                .collect();
            if add_bias {
                kept.push(1.0);
            }
            features[slot].push(kept);
            labels[slot].push(label);
        }

        for (rows, row_labels) in features.iter_mut().zip(labels.iter_mut()) {
            let keep = (keep_proportion * rows.len() as f64).round() as usize;
            rows.truncate(keep);
            row_labels.truncate(keep);
        }

        DataSet::new(features, labels)
    }
}
