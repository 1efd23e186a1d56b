//! Hierarchical Bayesian probit classifier
//!
//! Generative model, per feature `f` and resident `r`:
//!
//! ```text
//! mean_f      ~ Gaussian                      (community)
//! precision_f ~ Gamma                         (community)
//! w_rf        ~ N(mean_f, 1 / precision_f)
//! label       = (w_r · x + ε > 0),  ε ~ N(0, 1 / noise_precision)
//! ```
//!
//! Each resident's weights are inferred by expectation propagation over the
//! per-example probit sites with a fully factorised Gaussian posterior.
//! Community beliefs are then updated from the residents' data messages:
//! Gaussian products for the means and a conjugate variational step for the
//! precisions.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::distributions::{inverse_mills_ratio, log_normal_cdf, Bernoulli, Gamma, Gaussian};
use super::error::{ModelError, ModelResult};
use super::marginals::Marginals;
use super::ProbabilisticClassifier;
use crate::data::DataSet;

/// Data messages below this precision carry no information.
const MIN_DATA_PRECISION: f64 = 1e-12;

/// Configuration for the probit classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryModelConfig {
    /// Precision of the score noise before thresholding
    pub noise_precision: f64,
}

impl Default for BinaryModelConfig {
    fn default() -> Self {
        Self {
            noise_precision: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BinaryModel {
    config: BinaryModelConfig,
}

/// Moments of the tilted distribution for one site.
struct SiteUpdate {
    log_normaliser: f64,
    mean: Array1<f64>,
    variance: Array1<f64>,
}

/// Diagonal Gaussian over one resident's weights, in natural parameters.
struct ResidentPosterior {
    precision: Array1<f64>,
    precision_mean: Array1<f64>,
    /// Sum of site log normalisers from the first sweep
    log_evidence: f64,
    observed: bool,
}

impl ResidentPosterior {
    fn marginals(&self) -> Vec<Gaussian> {
        self.precision
            .iter()
            .zip(self.precision_mean.iter())
            .map(|(&p, &pm)| Gaussian::new(pm / p, 1.0 / p))
            .collect()
    }
}

impl BinaryModel {
    pub fn new(config: BinaryModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BinaryModelConfig {
        &self.config
    }

    fn noise_variance(&self) -> f64 {
        1.0 / self.config.noise_precision
    }

    fn check_dimensions(&self, dataset: &DataSet, priors: &Marginals, context: &str) -> ModelResult<()> {
        if self.config.noise_precision.is_nan() || self.config.noise_precision <= 0.0 {
            return Err(ModelError::improper(format!(
                "{}: noise precision {}",
                context, self.config.noise_precision
            )));
        }
        priors.validate()?;
        if !dataset.is_empty() && dataset.num_features() != priors.num_features() {
            return Err(ModelError::dimension_mismatch(
                priors.num_features(),
                dataset.num_features(),
                context,
            ));
        }
        Ok(())
    }

    /// Project the cavity times one probit likelihood onto a diagonal Gaussian.
    fn project(
        &self,
        x: ArrayView1<f64>,
        label: bool,
        mean: &Array1<f64>,
        variance: &Array1<f64>,
    ) -> ModelResult<SiteUpdate> {
        let sign = if label { 1.0 } else { -1.0 };
        let score_mean = x.dot(mean);
        let score_variance = x.mapv(|v| v * v).dot(variance) + self.noise_variance();
        let score_sd = score_variance.sqrt();
        let z = sign * score_mean / score_sd;

        let log_normaliser = log_normal_cdf(z);
        let ratio = inverse_mills_ratio(z);
        // First and second derivatives of ln Z with respect to the score mean
        let g = sign * ratio / score_sd;
        let h = -ratio * (ratio + z) / score_variance;

        let scaled = variance * &x;
        let new_mean = mean + &scaled.mapv(|v| v * g);
        let new_variance = variance + &(&scaled * &scaled).mapv(|v| v * h);

        let finite = log_normaliser.is_finite()
            && new_mean.iter().all(|v| v.is_finite())
            && new_variance.iter().all(|&v| v.is_finite() && v > 0.0);
        if !finite {
            return Err(ModelError::improper("probit moment matching"));
        }

        Ok(SiteUpdate {
            log_normaliser,
            mean: new_mean,
            variance: new_variance,
        })
    }

    fn infer_resident(
        &self,
        features: &[Vec<f64>],
        labels: &[bool],
        prior: &[Gaussian],
        iterations: usize,
    ) -> ModelResult<ResidentPosterior> {
        let n = features.len();
        let d = prior.len();

        let mut precision: Array1<f64> = prior.iter().map(Gaussian::precision).collect();
        let mut precision_mean: Array1<f64> = prior.iter().map(Gaussian::precision_mean).collect();
        let mut site_precision = Array2::<f64>::zeros((n, d));
        let mut site_precision_mean = Array2::<f64>::zeros((n, d));
        let mut log_evidence = 0.0;

        for sweep in 0..iterations.max(1) {
            for (i, (row, &label)) in features.iter().zip(labels).enumerate() {
                let cavity_precision = &precision - &site_precision.row(i);
                if cavity_precision.iter().any(|&p| p <= 0.0 || !p.is_finite()) {
                    return Err(ModelError::improper(format!("cavity of example {}", i)));
                }
                let cavity_precision_mean = &precision_mean - &site_precision_mean.row(i);
                let cavity_variance = cavity_precision.mapv(f64::recip);
                let cavity_mean = &cavity_precision_mean * &cavity_variance;

                let update = self.project(
                    ArrayView1::from(row.as_slice()),
                    label,
                    &cavity_mean,
                    &cavity_variance,
                )?;
                if sweep == 0 {
                    log_evidence += update.log_normaliser;
                }

                let new_precision = update.variance.mapv(f64::recip);
                let new_precision_mean = &update.mean * &new_precision;
                site_precision
                    .row_mut(i)
                    .assign(&(&new_precision - &cavity_precision));
                site_precision_mean
                    .row_mut(i)
                    .assign(&(&new_precision_mean - &cavity_precision_mean));
                precision = new_precision;
                precision_mean = new_precision_mean;
            }
        }

        Ok(ResidentPosterior {
            precision,
            precision_mean,
            log_evidence,
            observed: n > 0,
        })
    }

    fn update_weight_means(
        &self,
        priors: &Marginals,
        resident_prior: &[Gaussian],
        posteriors: &[ResidentPosterior],
    ) -> ModelResult<Vec<Gaussian>> {
        (0..priors.num_features())
            .map(|f| {
                let plug_in_variance = priors.weight_precisions[f].mean_reciprocal();
                let mut belief = priors.weight_means[f];
                for posterior in posteriors.iter().filter(|p| p.observed) {
                    let data_precision = posterior.precision[f] - resident_prior[f].precision();
                    if data_precision <= MIN_DATA_PRECISION {
                        continue;
                    }
                    let data_mean = (posterior.precision_mean[f]
                        - resident_prior[f].precision_mean())
                        / data_precision;
                    let message = Gaussian::new(data_mean, data_precision.recip() + plug_in_variance);
                    belief = belief
                        .product(&message)
                        .ok_or_else(|| ModelError::improper(format!("weight mean {}", f)))?;
                }
                Ok(belief)
            })
            .collect()
    }

    fn update_weight_precisions(
        &self,
        priors: &Marginals,
        weight_means: &[Gaussian],
        posteriors: &[ResidentPosterior],
    ) -> ModelResult<Vec<Gamma>> {
        let observed: Vec<Vec<Gaussian>> = posteriors
            .iter()
            .filter(|p| p.observed)
            .map(ResidentPosterior::marginals)
            .collect();

        (0..priors.num_features())
            .map(|f| {
                let prior = priors.weight_precisions[f];
                let mean = weight_means[f];
                let spread: f64 = observed
                    .iter()
                    .map(|w| w[f].variance + mean.variance + (w[f].mean - mean.mean).powi(2))
                    .sum();
                let updated = Gamma::new(
                    prior.shape + 0.5 * observed.len() as f64,
                    prior.rate + 0.5 * spread,
                );
                if updated.is_proper() {
                    Ok(updated)
                } else {
                    Err(ModelError::improper(format!("weight precision {}", f)))
                }
            })
            .collect()
    }
}

impl ProbabilisticClassifier for BinaryModel {
    fn train(
        &self,
        dataset: &DataSet,
        priors: &Marginals,
        iterations: usize,
    ) -> ModelResult<Marginals> {
        if dataset.num_residents() == 0 {
            return Err(ModelError::empty("train"));
        }
        self.check_dimensions(dataset, priors, "train")?;

        let resident_prior = priors.resident_prior();
        let posteriors = (0..dataset.num_residents())
            .map(|r| {
                self.infer_resident(
                    dataset.features(r),
                    dataset.labels(r),
                    &resident_prior,
                    iterations,
                )
            })
            .collect::<ModelResult<Vec<_>>>()?;

        let weight_means = self.update_weight_means(priors, &resident_prior, &posteriors)?;
        let weight_precisions = self.update_weight_precisions(priors, &weight_means, &posteriors)?;

        Ok(Marginals {
            weight_means,
            weight_precisions,
            weights: Some(posteriors.iter().map(ResidentPosterior::marginals).collect()),
        })
    }

    fn predict(&self, dataset: &DataSet, priors: &Marginals) -> ModelResult<Vec<Vec<Bernoulli>>> {
        self.check_dimensions(dataset, priors, "predict")?;

        let resident_prior = priors.resident_prior();
        let mean: Array1<f64> = resident_prior.iter().map(|g| g.mean).collect();
        let variance: Array1<f64> = resident_prior.iter().map(|g| g.variance).collect();
        let noise = self.noise_variance();

        Ok((0..dataset.num_residents())
            .map(|r| {
                dataset
                    .features(r)
                    .iter()
                    .map(|row| {
                        let x = ArrayView1::from(row.as_slice());
                        let score_variance = x.mapv(|v| v * v).dot(&variance) + noise;
                        let z = x.dot(&mean) / score_variance.sqrt();
                        Bernoulli::from_log_odds(log_normal_cdf(z) - log_normal_cdf(-z))
                    })
                    .collect()
            })
            .collect())
    }

    fn compute_evidence(&self, dataset: &DataSet, priors: &Marginals) -> ModelResult<Bernoulli> {
        self.check_dimensions(dataset, priors, "evidence")?;

        let resident_prior = priors.resident_prior();
        let mut log_evidence = 0.0;
        for r in 0..dataset.num_residents() {
            log_evidence += self
                .infer_resident(dataset.features(r), dataset.labels(r), &resident_prior, 1)?
                .log_evidence;
        }

        Ok(Bernoulli::from_log_odds(log_evidence))
    }
}
