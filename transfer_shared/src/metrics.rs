//! Per-run prediction scores.
//!
//! A [`Metrics`] value pairs true labels with predicted probabilities and
//! derives the scores used to compare selection policies:
//! - log probability of the truth (summed, and as a running sum)
//! - accuracy at the 0.5 threshold (averaged, and as a running average)
//! - Brier score (averaged, and as a running average)

use serde::{Deserialize, Serialize};

/// A single scored prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub truth: bool,
    /// Predicted probability that the label is `true`.
    pub probability: f64,
}

impl Prediction {
    pub fn new(truth: bool, probability: f64) -> Self {
        Self { truth, probability }
    }

    /// Natural log of the probability assigned to the true label.
    pub fn log_prob_of_truth(&self) -> f64 {
        if self.truth {
            self.probability.ln()
        } else {
            (1.0 - self.probability).ln()
        }
    }

    /// Whether the thresholded prediction matches the truth.
    pub fn correct(&self) -> bool {
        self.truth == (self.probability > 0.5)
    }

    pub fn brier_score(&self) -> f64 {
        let target = if self.truth { 1.0 } else { 0.0 };
        (target - self.probability).powi(2)
    }
}

/// Scores for one named run over a sequence of predictions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub name: String,
    pub predictions: Vec<Prediction>,
}

impl Metrics {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predictions: Vec::new(),
        }
    }

    /// Build from parallel label and probability slices.
    ///
    /// Both slices must have the same length.
    pub fn from_labels(name: impl Into<String>, truths: &[bool], probabilities: &[f64]) -> Self {
        debug_assert_eq!(
            truths.len(),
            probabilities.len(),
            "labels and probabilities differ in length"
        );
        Self {
            name: name.into(),
            predictions: truths
                .iter()
                .zip(probabilities)
                .map(|(&truth, &probability)| Prediction::new(truth, probability))
                .collect(),
        }
    }

    pub fn push(&mut self, truth: bool, probability: f64) {
        self.predictions.push(Prediction::new(truth, probability));
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    fn average_by<F: Fn(&Prediction) -> f64>(&self, f: F) -> f64 {
        if self.predictions.is_empty() {
            return f64::NAN;
        }
        self.predictions.iter().map(f).sum::<f64>() / self.predictions.len() as f64
    }

    pub fn mean_squared_error(&self) -> f64 {
        self.average_by(Prediction::brier_score)
    }

    pub fn sum_log_prob_of_truth(&self) -> f64 {
        if self.predictions.is_empty() {
            return f64::NAN;
        }
        self.predictions.iter().map(Prediction::log_prob_of_truth).sum()
    }

    pub fn average_accuracy(&self) -> f64 {
        self.average_by(|p| if p.correct() { 1.0 } else { 0.0 })
    }

    pub fn brier_score(&self) -> f64 {
        self.average_by(Prediction::brier_score)
    }

    /// Running sum of the log probability of truth.
    pub fn cumulative_log_prob_of_truth(&self) -> Vec<f64> {
        self.predictions
            .iter()
            .scan(0.0, |acc, p| {
                *acc += p.log_prob_of_truth();
                Some(*acc)
            })
            .collect()
    }

    /// Running average of accuracy.
    pub fn cumulative_accuracy(&self) -> Vec<f64> {
        running_average(
            self.predictions
                .iter()
                .map(|p| if p.correct() { 1.0 } else { 0.0 }),
        )
    }

    /// Running average of the Brier score.
    pub fn cumulative_brier_score(&self) -> Vec<f64> {
        running_average(self.predictions.iter().map(Prediction::brier_score))
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{:<20}: MSE {:.2}, Error rate {:.2}, Log prob of truth {:.2}",
            self.name,
            self.mean_squared_error(),
            1.0 - self.average_accuracy(),
            self.sum_log_prob_of_truth()
        )
    }
}

fn running_average<I: Iterator<Item = f64>>(values: I) -> Vec<f64> {
    values
        .enumerate()
        .scan(0.0, |acc, (i, v)| {
            *acc += v;
            Some(*acc / (i + 1) as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_scores() {
        let p = Prediction::new(true, 0.8);
        assert!(p.correct());
        assert!((p.log_prob_of_truth() - 0.8f64.ln()).abs() < 1e-12);
        assert!((p.brier_score() - 0.04).abs() < 1e-12);

        let q = Prediction::new(false, 0.8);
        assert!(!q.correct());
        assert!((q.log_prob_of_truth() - 0.2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(!Prediction::new(true, 0.5).correct());
        assert!(Prediction::new(false, 0.5).correct());
    }

    #[test]
    fn test_empty_metrics_are_nan() {
        let m = Metrics::new("empty");
        assert!(m.average_accuracy().is_nan());
        assert!(m.sum_log_prob_of_truth().is_nan());
        assert!(m.brier_score().is_nan());
        assert!(m.cumulative_accuracy().is_empty());
    }

    #[test]
    fn test_cumulative_curves() {
        let m = Metrics::from_labels("run", &[true, false, true], &[0.9, 0.6, 0.7]);

        assert_eq!(m.len(), 3);
        let acc = m.cumulative_accuracy();
        assert_eq!(acc.len(), 3);
        assert!((acc[0] - 1.0).abs() < 1e-12);
        assert!((acc[1] - 0.5).abs() < 1e-12);
        assert!((acc[2] - 2.0 / 3.0).abs() < 1e-12);

        let lp = m.cumulative_log_prob_of_truth();
        let expected = 0.9f64.ln() + 0.4f64.ln() + 0.7f64.ln();
        assert!((lp[2] - expected).abs() < 1e-12);
        assert!((m.sum_log_prob_of_truth() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_summary_mentions_name() {
        let m = Metrics::from_labels("VOI+", &[true], &[0.9]);
        assert!(m.summary().starts_with("VOI+"));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "differ in length")]
    fn from_labels_rejects_length_mismatch() {
        Metrics::from_labels("run", &[true, false], &[0.9]);
    }
}
