//! Synthetic data drawn from the hierarchical probit model.
//!
//! Community weights are drawn once per generator; every call to
//! [`ToyData::generate`] reuses them, so a training set and a holdout set
//! produced by the same generator describe the same residents.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::dataset::DataSet;
use super::error::{DataError, DataResult};
use crate::model::{Gamma, Gaussian};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToyDataConfig {
    pub num_residents: usize,
    pub num_features: usize,
    /// Append a constant `-1` feature.
    pub use_bias: bool,
    pub true_prior_mean: Gaussian,
    /// Each community weight's variance is drawn from this Gamma.
    pub true_prior_precision: Gamma,
    pub seed: u64,
}

impl Default for ToyDataConfig {
    fn default() -> Self {
        Self {
            num_residents: 5,
            num_features: 10,
            use_bias: false,
            true_prior_mean: Gaussian::new(4.0, 1.0),
            true_prior_precision: Gamma::new(1.0, 1.0),
            seed: 0,
        }
    }
}

impl ToyDataConfig {
    pub fn num_features_with_bias(&self) -> usize {
        self.num_features + usize::from(self.use_bias)
    }
}

pub struct ToyData {
    config: ToyDataConfig,
    rng: StdRng,
    community_weights: Vec<Gaussian>,
    weights: Vec<Vec<f64>>,
}

impl ToyData {
    /// Draw the community and per-resident weights.
    pub fn new(config: ToyDataConfig) -> DataResult<Self> {
        if !config.true_prior_mean.is_proper() {
            return Err(DataError::invalid_parameter(
                "true_prior_mean.variance",
                config.true_prior_mean.variance,
                "> 0",
            ));
        }
        if !config.true_prior_precision.is_proper() {
            return Err(DataError::invalid_parameter(
                "true_prior_precision",
                format!("{:?}", config.true_prior_precision),
                "shape > 0 and rate > 0",
            ));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let width = config.num_features_with_bias();

        let community_weights = (0..width)
            .map(|_| {
                let mean = config.true_prior_mean.sample(&mut rng);
                let variance = config.true_prior_precision.sample(&mut rng).map_err(|err| {
                    DataError::invalid_parameter("true_prior_precision", err, "samplable Gamma")
                })?;
                Ok(Gaussian::new(mean, variance))
            })
            .collect::<DataResult<Vec<_>>>()?;

        let weights = (0..config.num_residents)
            .map(|_| community_weights.iter().map(|w| w.sample(&mut rng)).collect())
            .collect();

        Ok(Self {
            config,
            rng,
            community_weights,
            weights,
        })
    }

    pub fn config(&self) -> &ToyDataConfig {
        &self.config
    }

    pub fn community_weights(&self) -> &[Gaussian] {
        &self.community_weights
    }

    /// True weights, `weights[resident][feature]`.
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// `count` examples per resident. Each example is all-zero with
    /// probability `noise_proportion`, otherwise uniform in `[-0.5, 0.5)`;
    /// the label is `w . x + N(0, 1) > 0`.
    pub fn generate(&mut self, noise_proportion: f64, count: usize) -> DataResult<DataSet> {
        if !(0.0..=1.0).contains(&noise_proportion) {
            return Err(DataError::invalid_parameter(
                "noise_proportion",
                noise_proportion,
                "0 <= noise_proportion <= 1",
            ));
        }

        let num_features = self.config.num_features;
        let mut features = Vec::with_capacity(self.weights.len());
        let mut labels = Vec::with_capacity(self.weights.len());

        for weights in &self.weights {
            let mut rows = Vec::with_capacity(count);
            let mut row_labels = Vec::with_capacity(count);
            for _ in 0..count {
                let informative = self.rng.gen::<f64>() > noise_proportion;
                let row: Vec<f64> = (0..weights.len())
                    .map(|k| {
                        if k == num_features {
                            -1.0
                        } else if informative {
                            self.rng.gen::<f64>() - 0.5
                        } else {
                            0.0
                        }
                    })
                    .collect();
                let score: f64 = row.iter().zip(weights).map(|(x, w)| x * w).sum();
                let noisy = Gaussian::new(score, 1.0).sample(&mut self.rng);
                rows.push(row);
                row_labels.push(noisy > 0.0);
            }
            features.push(rows);
            labels.push(row_labels);
        }

        DataSet::new(features, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let mut toy = ToyData::new(ToyDataConfig {
            num_residents: 3,
            num_features: 4,
            use_bias: true,
            ..ToyDataConfig::default()
        })
        .unwrap();
        assert_eq!(toy.community_weights().len(), 5);
        assert_eq!(toy.weights().len(), 3);

        let data = toy.generate(0.0, 20).unwrap();
        assert_eq!(data.num_residents(), 3);
        assert_eq!(data.num_instances(), vec![20, 20, 20]);
        assert_eq!(data.num_features(), 5);
        assert!(data.features(0).iter().all(|row| row[4] == -1.0));
    }

    #[test]
    fn test_fully_noisy_rows_are_zero() {
        let mut toy = ToyData::new(ToyDataConfig::default()).unwrap();
        let data = toy.generate(1.0, 10).unwrap();
        for r in 0..data.num_residents() {
            assert!(data.features(r).iter().flatten().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = ToyData::new(ToyDataConfig::default()).unwrap();
        let b = ToyData::new(ToyDataConfig::default()).unwrap();
        assert_eq!(a.weights(), b.weights());

        let c = ToyData::new(ToyDataConfig {
            seed: 7,
            ..ToyDataConfig::default()
        })
        .unwrap();
        assert_ne!(a.weights(), c.weights());
    }

    #[test]
    fn test_labels_follow_weights() {
        // strongly positive weights make most informative examples with
        // positive feature sums positive
        let mut toy = ToyData::new(ToyDataConfig {
            num_residents: 1,
            num_features: 3,
            true_prior_mean: Gaussian::new(20.0, 0.01),
            true_prior_precision: Gamma::new(100.0, 10000.0),
            ..ToyDataConfig::default()
        })
        .unwrap();
        let data = toy.generate(0.0, 400).unwrap();
        let agree = data
            .features(0)
            .iter()
            .zip(data.labels(0))
            .filter(|&(row, &label)| (row.iter().sum::<f64>() > 0.0) == label)
            .count();
        assert!(agree > 300);
    }

    #[test]
    fn test_community_variance_drawn_from_gamma() {
        let toy = ToyData::new(ToyDataConfig {
            num_features: 6,
            true_prior_precision: Gamma::new(10000.0, 1e6),
            ..ToyDataConfig::default()
        })
        .unwrap();
        for weight in toy.community_weights() {
            assert!((weight.variance - 0.01).abs() < 1e-3);
        }
    }

    #[test]
    fn test_rejects_bad_proportion() {
        let mut toy = ToyData::new(ToyDataConfig::default()).unwrap();
        assert!(toy.generate(1.5, 10).is_err());
    }
}
