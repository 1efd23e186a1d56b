//! Aggregation of metrics across residents.

use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;
use crate::stats::{column_average, column_std_dev};

/// Mean and standard deviation curves for the three tracked scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateCurves {
    pub average_log_prob: Vec<f64>,
    pub std_dev_log_prob: Vec<f64>,
    pub average_accuracy: Vec<f64>,
    pub std_dev_accuracy: Vec<f64>,
    pub average_brier_score: Vec<f64>,
    pub std_dev_brier_score: Vec<f64>,
}

impl AggregateCurves {
    fn from_tables(log_probs: &[Vec<f64>], accuracies: &[Vec<f64>], briers: &[Vec<f64>]) -> Self {
        Self {
            average_log_prob: column_average(log_probs),
            std_dev_log_prob: column_std_dev(log_probs),
            average_accuracy: column_average(accuracies),
            std_dev_accuracy: column_std_dev(accuracies),
            average_brier_score: column_average(briers),
            std_dev_brier_score: column_std_dev(briers),
        }
    }

    pub fn len(&self) -> usize {
        self.average_accuracy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.average_accuracy.is_empty()
    }
}

/// Cumulative online-learning curves, one [`Metrics`] per resident.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollection {
    metrics: Vec<Metrics>,
    aggregate: AggregateCurves,
}

impl MetricsCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, metrics: Metrics) {
        self.metrics.push(metrics);
    }

    pub fn metrics(&self) -> &[Metrics] {
        &self.metrics
    }

    /// Length of the shortest run, `0` when empty.
    pub fn minimum_length(&self) -> usize {
        self.metrics.iter().map(Metrics::len).min().unwrap_or(0)
    }

    /// Recompute per-position statistics, truncated to the shortest run.
    pub fn recompute_aggregate(&mut self) -> &AggregateCurves {
        let n = self.minimum_length();
        let truncate = |curve: Vec<f64>| curve.into_iter().take(n).collect::<Vec<_>>();

        let log_probs: Vec<Vec<f64>> = self
            .metrics
            .iter()
            .map(|m| truncate(m.cumulative_log_prob_of_truth()))
            .collect();
        let accuracies: Vec<Vec<f64>> = self
            .metrics
            .iter()
            .map(|m| truncate(m.cumulative_accuracy()))
            .collect();
        let briers: Vec<Vec<f64>> = self
            .metrics
            .iter()
            .map(|m| truncate(m.cumulative_brier_score()))
            .collect();

        self.aggregate = AggregateCurves::from_tables(&log_probs, &accuracies, &briers);
        &self.aggregate
    }

    pub fn aggregate(&self) -> &AggregateCurves {
        &self.aggregate
    }
}

/// Holdout scores recorded after every active-learning round.
///
/// `rounds[resident][round]` is the holdout [`Metrics`] for that resident
/// before the round's selection.
#[derive(Debug, Clone, Default)]
pub struct HoldoutMetricsCollection {
    rounds: Vec<Vec<Metrics>>,
    aggregate: AggregateCurves,
}

impl HoldoutMetricsCollection {
    pub fn new(residents: usize) -> Self {
        Self {
            rounds: vec![Vec::new(); residents],
            aggregate: AggregateCurves::default(),
        }
    }

    /// Record one round for `resident`, growing the table as needed.
    pub fn record(&mut self, resident: usize, metrics: Metrics) {
        if self.rounds.len() <= resident {
            self.rounds.resize_with(resident + 1, Vec::new);
        }
        self.rounds[resident].push(metrics);
    }

    pub fn rounds(&self) -> &[Vec<Metrics>] {
        &self.rounds
    }

    pub fn recompute_aggregate(&mut self) -> &AggregateCurves {
        let table = |f: fn(&Metrics) -> f64| -> Vec<Vec<f64>> {
            self.rounds
                .iter()
                .map(|row| row.iter().map(f).collect())
                .collect()
        };
        let log_probs = table(Metrics::sum_log_prob_of_truth);
        let accuracies = table(Metrics::average_accuracy);
        let briers = table(Metrics::brier_score);

        self.aggregate = AggregateCurves::from_tables(&log_probs, &accuracies, &briers);
        &self.aggregate
    }

    pub fn aggregate(&self) -> &AggregateCurves {
        &self.aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_truncates_to_shortest_run() {
        let mut collection = MetricsCollection::new();
        collection.add(Metrics::from_labels("a", &[true, true, true], &[0.9, 0.9, 0.9]));
        collection.add(Metrics::from_labels("b", &[true, false], &[0.9, 0.9]));

        assert_eq!(collection.minimum_length(), 2);
        let aggregate = collection.recompute_aggregate().clone();
        assert_eq!(aggregate.len(), 2);
        assert!((aggregate.average_accuracy[0] - 1.0).abs() < 1e-12);
        assert!((aggregate.average_accuracy[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_holdout_columns() {
        let mut holdout = HoldoutMetricsCollection::new(2);
        holdout.record(0, Metrics::from_labels("r0", &[true, false], &[0.9, 0.1]));
        holdout.record(0, Metrics::from_labels("r0", &[true, false], &[0.9, 0.9]));
        holdout.record(1, Metrics::from_labels("r1", &[true, false], &[0.1, 0.1]));
        holdout.record(1, Metrics::from_labels("r1", &[true, false], &[0.9, 0.1]));

        let aggregate = holdout.recompute_aggregate();
        assert_eq!(aggregate.average_accuracy, vec![0.75, 0.75]);
        assert!(aggregate.std_dev_accuracy[0] > 0.0);
    }

    #[test]
    fn test_record_grows_table() {
        let mut holdout = HoldoutMetricsCollection::new(0);
        holdout.record(2, Metrics::new("late"));
        assert_eq!(holdout.rounds().len(), 3);
    }
}
