//! Per-resident feature vectors and binary labels.
//!
//! Every sub-setting operation returns an owned [`DataSet`]; nothing aliases
//! the source labels, so a subset can be relabelled for a hypothesis without
//! affecting the data it came from.

use serde::{Deserialize, Serialize};

use super::error::{DataError, DataResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    /// `features[resident][example][feature]`
    features: Vec<Vec<Vec<f64>>>,
    /// `labels[resident][example]`
    labels: Vec<Vec<bool>>,
}

impl DataSet {
    /// Build a data set, checking that every resident has one label per
    /// example and that all feature vectors share a length.
    pub fn new(features: Vec<Vec<Vec<f64>>>, labels: Vec<Vec<bool>>) -> DataResult<Self> {
        if features.len() != labels.len() {
            return Err(DataError::dimension_mismatch(
                features.len(),
                labels.len(),
                "label residents",
            ));
        }

        let mut width: Option<usize> = None;
        for (resident, (rows, row_labels)) in features.iter().zip(&labels).enumerate() {
            if rows.len() != row_labels.len() {
                return Err(DataError::dimension_mismatch(
                    rows.len(),
                    row_labels.len(),
                    format!("labels of resident {}", resident),
                ));
            }
            for row in rows {
                match width {
                    None => width = Some(row.len()),
                    Some(w) if w != row.len() => {
                        return Err(DataError::dimension_mismatch(
                            w,
                            row.len(),
                            format!("feature vector of resident {}", resident),
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self { features, labels })
    }

    /// Data set with no residents.
    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn num_residents(&self) -> usize {
        self.features.len()
    }

    /// Number of examples for each resident.
    pub fn num_instances(&self) -> Vec<usize> {
        self.labels.iter().map(Vec::len).collect()
    }

    pub fn num_examples(&self, resident: usize) -> usize {
        self.labels.get(resident).map_or(0, Vec::len)
    }

    pub fn total_examples(&self) -> usize {
        self.labels.iter().map(Vec::len).sum()
    }

    /// Feature vector length, `0` when the data set holds no examples.
    pub fn num_features(&self) -> usize {
        self.features
            .iter()
            .flat_map(|rows| rows.first())
            .map(Vec::len)
            .next()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_examples() == 0
    }

    pub fn features(&self, resident: usize) -> &[Vec<f64>] {
        self.features.get(resident).map_or(&[][..], Vec::as_slice)
    }

    pub fn labels(&self, resident: usize) -> &[bool] {
        self.labels.get(resident).map_or(&[][..], Vec::as_slice)
    }

    pub fn all_labels(&self) -> &[Vec<bool>] {
        &self.labels
    }

    fn check_resident(&self, resident: usize, context: &str) -> DataResult<()> {
        if resident >= self.num_residents() {
            return Err(DataError::index_out_of_range(
                resident,
                self.num_residents(),
                context,
            ));
        }
        Ok(())
    }

    /// All examples of one resident.
    pub fn resident_subset(&self, resident: usize) -> DataResult<Self> {
        self.check_resident(resident, "resident subset")?;
        Ok(Self {
            features: vec![self.features[resident].clone()],
            labels: vec![self.labels[resident].clone()],
        })
    }

    /// Selected examples of one resident, in the order given.
    pub fn subset(&self, resident: usize, indices: &[usize]) -> DataResult<Self> {
        self.subset_many(&[resident], indices)
    }

    /// The same example indices taken from each of several residents.
    pub fn subset_many(&self, residents: &[usize], indices: &[usize]) -> DataResult<Self> {
        let mut features = Vec::with_capacity(residents.len());
        let mut labels = Vec::with_capacity(residents.len());

        for &resident in residents {
            self.check_resident(resident, "subset")?;
            let len = self.labels[resident].len();
            let mut rows = Vec::with_capacity(indices.len());
            let mut row_labels = Vec::with_capacity(indices.len());
            for &index in indices {
                if index >= len {
                    return Err(DataError::index_out_of_range(
                        index,
                        len,
                        format!("examples of resident {}", resident),
                    ));
                }
                rows.push(self.features[resident][index].clone());
                row_labels.push(self.labels[resident][index]);
            }
            features.push(rows);
            labels.push(row_labels);
        }

        Ok(Self { features, labels })
    }

    /// Copy with a single label replaced.
    pub fn with_label(&self, resident: usize, index: usize, value: bool) -> DataResult<Self> {
        self.check_resident(resident, "relabel")?;
        let len = self.labels[resident].len();
        if index >= len {
            return Err(DataError::index_out_of_range(index, len, "relabel"));
        }
        let mut copy = self.clone();
        copy.labels[resident][index] = value;
        Ok(copy)
    }

    /// Split every resident into a leading train part of `ceil(p * n)`
    /// examples and a trailing test part.
    pub fn split_train_test(&self, train_proportion: f64) -> DataResult<(Self, Self)> {
        if !(0.0..=1.0).contains(&train_proportion) {
            return Err(DataError::invalid_parameter(
                "train_proportion",
                train_proportion,
                "0 <= p <= 1",
            ));
        }

        let mut train = Self::empty();
        let mut test = Self::empty();
        for (rows, row_labels) in self.features.iter().zip(&self.labels) {
            let count = (train_proportion * row_labels.len() as f64).ceil() as usize;
            let count = count.min(row_labels.len());
            train.features.push(rows[..count].to_vec());
            train.labels.push(row_labels[..count].to_vec());
            test.features.push(rows[count..].to_vec());
            test.labels.push(row_labels[count..].to_vec());
        }

        Ok((train, test))
    }

    /// Fraction of positive labels per resident (`NaN` for an empty resident).
    pub fn class_ratios(&self) -> Vec<f64> {
        self.labels
            .iter()
            .map(|row| {
                if row.is_empty() {
                    f64::NAN
                } else {
                    row.iter().filter(|&&l| l).count() as f64 / row.len() as f64
                }
            })
            .collect()
    }
}
