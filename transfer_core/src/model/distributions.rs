//! Scalar distributions used by the classifier and its belief state.
//!
//! Also hosts the Gaussian tail functions the probit likelihood needs,
//! built on `statrs`. Far in the lower tail `ln Φ` switches to its
//! asymptotic series so that it stays finite where `erfc` underflows.

use std::f64::consts::{PI, SQRT_2};

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use statrs::function::erf;

use super::error::{ModelError, ModelResult};

/// Below this `z`, `ln Φ(z)` uses the asymptotic expansion.
const LOWER_TAIL_CUTOFF: f64 = -20.0;

/// Complementary error function.
pub fn erfc(x: f64) -> f64 {
    erf::erfc(x)
}

/// Standard normal density.
pub fn normal_pdf(z: f64) -> f64 {
    log_normal_pdf(z).exp()
}

pub fn log_normal_pdf(z: f64) -> f64 {
    -0.5 * z * z - 0.5 * (2.0 * PI).ln()
}

/// Standard normal CDF, `Φ(z)`.
pub fn normal_cdf(z: f64) -> f64 {
    if z < 0.0 {
        0.5 * erf::erfc(-z / SQRT_2)
    } else {
        0.5 * (1.0 + erf::erf(z / SQRT_2))
    }
}

/// `ln Φ(z)`, accurate in both tails.
pub fn log_normal_cdf(z: f64) -> f64 {
    if z < LOWER_TAIL_CUTOFF {
        // ln φ(z) - ln(-z) + ln(1 - 1/z² + 3/z⁴ - 15/z⁶)
        let inv = 1.0 / (z * z);
        let series = 1.0 - inv * (1.0 - 3.0 * inv * (1.0 - 5.0 * inv));
        log_normal_pdf(z) - (-z).ln() + series.ln()
    } else if z < 0.0 {
        (0.5 * erf::erfc(-z / SQRT_2)).ln()
    } else {
        (-0.5 * erf::erfc(z / SQRT_2)).ln_1p()
    }
}

/// Inverse Mills ratio `φ(z) / Φ(z)`.
pub fn inverse_mills_ratio(z: f64) -> f64 {
    (log_normal_pdf(z) - log_normal_cdf(z)).exp()
}

/// Gaussian parameterised by mean and variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub mean: f64,
    pub variance: f64,
}

impl Gaussian {
    pub fn new(mean: f64, variance: f64) -> Self {
        Self { mean, variance }
    }

    pub fn standard() -> Self {
        Self::new(0.0, 1.0)
    }

    /// From natural parameters (precision × mean, precision).
    ///
    /// `None` when the precision is not strictly positive and finite.
    pub fn from_natural(precision_mean: f64, precision: f64) -> Option<Self> {
        if precision <= 0.0 || !precision.is_finite() || !precision_mean.is_finite() {
            return None;
        }
        Some(Self::new(precision_mean / precision, 1.0 / precision))
    }

    pub fn precision(&self) -> f64 {
        1.0 / self.variance
    }

    pub fn precision_mean(&self) -> f64 {
        self.mean / self.variance
    }

    pub fn is_proper(&self) -> bool {
        self.mean.is_finite() && self.variance.is_finite() && self.variance > 0.0
    }

    /// Normalised product of two densities.
    pub fn product(&self, other: &Gaussian) -> Option<Gaussian> {
        Gaussian::from_natural(
            self.precision_mean() + other.precision_mean(),
            self.precision() + other.precision(),
        )
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let z: f64 = StandardNormal.sample(rng);
        self.mean + self.variance.max(0.0).sqrt() * z
    }
}

impl Default for Gaussian {
    fn default() -> Self {
        Self::standard()
    }
}

/// Gamma parameterised by shape and rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gamma {
    pub shape: f64,
    pub rate: f64,
}

impl Gamma {
    pub fn new(shape: f64, rate: f64) -> Self {
        Self { shape, rate }
    }

    pub fn mean(&self) -> f64 {
        self.shape / self.rate
    }

    pub fn variance(&self) -> f64 {
        self.shape / (self.rate * self.rate)
    }

    /// Reciprocal of the mean, used as the plug-in variance of a Gaussian
    /// whose precision follows this distribution.
    pub fn mean_reciprocal(&self) -> f64 {
        self.rate / self.shape
    }

    pub fn is_proper(&self) -> bool {
        self.shape.is_finite() && self.rate.is_finite() && self.shape > 0.0 && self.rate > 0.0
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ModelResult<f64> {
        let gamma = rand_distr::Gamma::new(self.shape, 1.0 / self.rate)
            .map_err(|err| ModelError::improper(format!("gamma sampler: {err}")))?;
        Ok(gamma.sample(rng))
    }
}

impl Default for Gamma {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Distribution over a boolean, stored as log odds.
///
/// Model evidence is reported as a `Bernoulli` whose log odds equal the log
/// marginal likelihood of the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bernoulli {
    log_odds: f64,
}

impl Bernoulli {
    pub fn from_log_odds(log_odds: f64) -> Self {
        Self { log_odds }
    }

    pub fn from_prob(prob_true: f64) -> Self {
        Self {
            log_odds: prob_true.ln() - (1.0 - prob_true).ln(),
        }
    }

    pub fn log_odds(&self) -> f64 {
        self.log_odds
    }

    /// Probability of `true` (the mean).
    pub fn prob_true(&self) -> f64 {
        1.0 / (1.0 + (-self.log_odds).exp())
    }

    pub fn log_prob_true(&self) -> f64 {
        log_sigmoid(self.log_odds)
    }

    pub fn log_prob_false(&self) -> f64 {
        log_sigmoid(-self.log_odds)
    }

    pub fn log_prob(&self, value: bool) -> f64 {
        if value {
            self.log_prob_true()
        } else {
            self.log_prob_false()
        }
    }
}

fn log_sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        -(-x).exp().ln_1p()
    } else {
        x - x.exp().ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_normal_cdf_reference_values() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.0) - 0.841_344_746).abs() < 1e-6);
        assert!((normal_cdf(-1.96) - 0.024_997_895).abs() < 1e-6);
    }

    #[test]
    fn test_log_normal_cdf_far_tail_is_finite() {
        let v = log_normal_cdf(-40.0);
        assert!(v.is_finite());
        // Leading asymptotic term: -z²/2 - ln(-z) - ln √(2π)
        let asymptotic = -800.0 - 40f64.ln() - 0.5 * (2.0 * PI).ln();
        assert!((v - asymptotic).abs() < 1e-2);
        assert!(log_normal_cdf(40.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_cdf_is_double_precision() {
        assert!((normal_cdf(1.0) - 0.841_344_746_068_542_9).abs() < 1e-14);
        assert!((normal_cdf(-3.0) - 0.001_349_898_031_630_094_6).abs() < 1e-17);
        assert!((erfc(0.5) - 0.479_500_122_186_953_5).abs() < 1e-14);
    }

    #[test]
    fn test_log_normal_cdf_continuous_at_tail_switch() {
        let below = log_normal_cdf(LOWER_TAIL_CUTOFF - 1e-9);
        let above = log_normal_cdf(LOWER_TAIL_CUTOFF + 1e-9);
        assert!((below - above).abs() < 1e-6);
        assert!((log_normal_cdf(-10.0) - normal_cdf(-10.0).ln()).abs() < 1e-10);
    }

    #[test]
    fn test_inverse_mills_ratio_tails() {
        assert!((inverse_mills_ratio(0.0) - 2.0 * normal_pdf(0.0)).abs() < 1e-6);
        // φ(z)/Φ(z) ≈ -z for very negative z
        let r = inverse_mills_ratio(-30.0);
        assert!((r - 30.0).abs() < 0.1);
    }

    #[test]
    fn test_gaussian_product() {
        let a = Gaussian::new(0.0, 1.0);
        let b = Gaussian::new(2.0, 1.0);
        let c = a.product(&b).unwrap();
        assert!((c.mean - 1.0).abs() < 1e-12);
        assert!((c.variance - 0.5).abs() < 1e-12);
        assert!(Gaussian::from_natural(1.0, 0.0).is_none());
        assert!(Gaussian::from_natural(1.0, -1.0).is_none());
    }

    #[test]
    fn test_gamma_moments() {
        let g = Gamma::new(2.0, 4.0);
        assert!((g.mean() - 0.5).abs() < 1e-12);
        assert!((g.mean_reciprocal() - 2.0).abs() < 1e-12);
        assert!(g.is_proper());
        assert!(!Gamma::new(0.0, 1.0).is_proper());
    }

    #[test]
    fn test_bernoulli_accessors() {
        let b = Bernoulli::from_prob(0.8);
        assert!((b.prob_true() - 0.8).abs() < 1e-12);
        assert!((b.log_prob_true() - 0.8f64.ln()).abs() < 1e-12);
        assert!((b.log_prob(false) - 0.2f64.ln()).abs() < 1e-12);

        let evidence = Bernoulli::from_log_odds(-50.0);
        assert!(evidence.log_prob_true().is_finite());
        assert!((evidence.log_prob_true() + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_sampling_is_seeded() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let g = Gaussian::new(4.0, 1.0);
        assert_eq!(g.sample(&mut a), g.sample(&mut b));

        let gamma = Gamma::new(1.0, 1.0);
        let draw = gamma.sample(&mut a).unwrap();
        assert!(draw > 0.0);
        assert!(Gamma::new(-1.0, 1.0).sample(&mut a).is_err());
    }
}
