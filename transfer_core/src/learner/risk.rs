//! Expected-risk objective for ranking queries.
//!
//! For an example with predicted probability `p` of being positive:
//!
//! ```text
//! labelled, truth = true   : R[1][0] * (1 - p)
//! labelled, truth = false  : R[0][1] * p
//! unlabelled               : (R[1][0] + R[0][1]) * p * (1 - p)
//! query cost               : C[1] * p + C[0] * (1 - p)
//! ```
//!
//! Total risk sums the labelled and unlabelled terms over a partition.

use serde::{Deserialize, Serialize};

use super::error::{ActiveError, ActiveResult};
use super::partition::Partition;

/// Misclassification costs indexed `[truth][predicted]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMatrix([[f64; 2]; 2]);

impl RiskMatrix {
    pub fn new(matrix: [[f64; 2]; 2]) -> ActiveResult<Self> {
        for (t, row) in matrix.iter().enumerate() {
            for (p, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ActiveError::invalid_parameter(
                        format!("risk[{}][{}]", t, p),
                        value,
                        "finite and >= 0",
                    ));
                }
            }
        }
        Ok(Self(matrix))
    }

    pub fn get(&self, truth: bool, predicted: bool) -> f64 {
        self.0[truth as usize][predicted as usize]
    }

    /// Cost of predicting negative for a positive example.
    pub fn false_negative(&self) -> f64 {
        self.0[1][0]
    }

    /// Cost of predicting positive for a negative example.
    pub fn false_positive(&self) -> f64 {
        self.0[0][1]
    }

    pub fn as_array(&self) -> [[f64; 2]; 2] {
        self.0
    }
}

impl Default for RiskMatrix {
    fn default() -> Self {
        Self([[0.0, 1.0], [1.0, 0.0]])
    }
}

/// Cost of acquiring a label, indexed by the label's value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryCosts([f64; 2]);

impl QueryCosts {
    pub fn new(costs: [f64; 2]) -> ActiveResult<Self> {
        for (label, &value) in costs.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ActiveError::invalid_parameter(
                    format!("costs[{}]", label),
                    value,
                    "finite and >= 0",
                ));
            }
        }
        Ok(Self(costs))
    }

    /// Expected cost under predicted probability `p`.
    pub fn expected(&self, p: f64) -> f64 {
        self.0[1] * p + self.0[0] * (1.0 - p)
    }

    pub fn as_array(&self) -> [f64; 2] {
        self.0
    }
}

impl Default for QueryCosts {
    fn default() -> Self {
        Self([1.0, 1.0])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskObjective {
    pub risk: RiskMatrix,
    pub costs: QueryCosts,
}

impl RiskObjective {
    pub fn new(risk: RiskMatrix, costs: QueryCosts) -> Self {
        Self { risk, costs }
    }

    pub fn risk_of_labeled(&self, label: bool, p: f64) -> f64 {
        if label {
            self.risk.false_negative() * (1.0 - p)
        } else {
            self.risk.false_positive() * p
        }
    }

    pub fn risk_of_unlabeled(&self, p: f64) -> f64 {
        (self.risk.false_negative() + self.risk.false_positive()) * p * (1.0 - p)
    }

    pub fn query_cost(&self, p: f64) -> f64 {
        self.costs.expected(p)
    }

    /// Labelled plus unlabelled risk, summed in ascending index order.
    pub fn total_risk(
        &self,
        partition: &Partition,
        labels: &[bool],
        probabilities: &[f64],
    ) -> ActiveResult<f64> {
        if labels.len() != partition.len() {
            return Err(ActiveError::dimension_mismatch(
                partition.len(),
                labels.len(),
                "risk labels",
            ));
        }
        if probabilities.len() != partition.len() {
            return Err(ActiveError::dimension_mismatch(
                partition.len(),
                probabilities.len(),
                "risk probabilities",
            ));
        }

        let labeled: f64 = partition
            .labeled()
            .iter()
            .map(|&i| self.risk_of_labeled(labels[i], probabilities[i]))
            .sum();
        let unlabeled: f64 = partition
            .unlabeled()
            .iter()
            .map(|&i| self.risk_of_unlabeled(probabilities[i]))
            .sum();
        Ok(labeled + unlabeled)
    }

    /// Total risk per example; `0.0` for an empty pool.
    pub fn mean_risk(
        &self,
        partition: &Partition,
        labels: &[bool],
        probabilities: &[f64],
    ) -> ActiveResult<f64> {
        let total = self.total_risk(partition, labels, probabilities)?;
        if partition.is_empty() {
            return Ok(0.0);
        }
        Ok(total / partition.len() as f64)
    }

    /// Net value of querying an example with current probability `p`, given
    /// the total risk after learning it is positive or negative.
    ///
    /// Each hypothesis is weighted by the probability of the other outcome.
    pub fn value_of_information(
        &self,
        current_risk: f64,
        risk_if_true: f64,
        risk_if_false: f64,
        p: f64,
    ) -> f64 {
        let estimated = risk_if_true * (1.0 - p) + risk_if_false * p;
        current_risk - estimated - self.query_cost(p)
    }
}
