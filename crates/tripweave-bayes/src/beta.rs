use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::BayesError;

/// z-score of a two-sided 95% interval.
pub const Z_95: f64 = 1.96;

/// Beta(alpha, beta) belief over the chance a category is liked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaBelief {
    pub alpha: f64,
    pub beta: f64,
}

/// Normal-approximation interval around the Beta mean, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub mean: f64,
}

impl BetaBelief {
    pub fn new(alpha: f64, beta: f64) -> Result<Self, BayesError> {
        let belief = BetaBelief { alpha, beta };
        if belief.is_valid() {
            Ok(belief)
        } else {
            Err(BayesError::InvalidBelief { alpha, beta })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.alpha.is_finite() && self.beta.is_finite() && self.alpha > 0.0 && self.beta > 0.0
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn variance(&self) -> f64 {
        let total = self.alpha + self.beta;
        (self.alpha * self.beta) / (total * total * (total + 1.0))
    }

    /// Add one success (alpha) or one failure (beta). Returns the new mean.
    pub fn observe(&mut self, success: bool) -> f64 {
        if success {
            self.alpha += 1.0;
        } else {
            self.beta += 1.0;
        }
        self.mean()
    }

    /// Observations on top of a Beta(1, 1) baseline.
    pub fn samples(&self) -> f64 {
        self.alpha + self.beta - 2.0
    }

    pub fn confidence_interval(&self) -> ConfidenceInterval {
        self.interval_with_z(Z_95)
    }

    pub fn interval_with_z(&self, z: f64) -> ConfidenceInterval {
        let mean = self.mean();
        let spread = z * self.variance().sqrt();
        ConfidenceInterval {
            lower: (mean - spread).max(0.0),
            upper: (mean + spread).min(1.0),
            mean,
        }
    }

    /// Draw one value from the distribution as `X / (X + Y)` with
    /// `X ~ Gamma(alpha)` and `Y ~ Gamma(beta)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let x = sample_gamma(self.alpha, rng);
        let y = sample_gamma(self.beta, rng);
        if x + y > 0.0 { x / (x + y) } else { self.mean() }
    }
}

fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(f64::MIN_POSITIVE..1.0)
}

fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = open_unit(rng);
    let u2 = open_unit(rng);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

// Marsaglia-Tsang with unit scale; shapes below 1 use the power boost.
fn sample_gamma<R: Rng + ?Sized>(shape: f64, rng: &mut R) -> f64 {
    if shape < 1.0 {
        let u = open_unit(rng);
        return sample_gamma(shape + 1.0, rng) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }
        let u = open_unit(rng);
        if u < 1.0 - 0.0331 * x.powi(4) || u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn rejects_non_positive_parameters() {
        assert!(BetaBelief::new(0.0, 2.0).is_err());
        assert!(BetaBelief::new(2.0, -1.0).is_err());
        assert!(BetaBelief::new(f64::NAN, 1.0).is_err());
        assert!(BetaBelief::new(0.5, 0.5).is_ok());
    }

    #[test]
    fn observe_moves_the_mean() {
        let mut belief = BetaBelief::new(2.0, 2.0).expect("valid");
        assert_eq!(belief.observe(true), 0.6);
        assert_eq!(belief.observe(false), 0.5);
        assert_eq!(belief.samples(), 4.0);
    }

    #[test]
    fn interval_matches_normal_approximation() {
        let belief = BetaBelief::new(2.0, 2.0).expect("valid");
        let ci = belief.confidence_interval();
        let sd = (4.0f64 / (16.0 * 5.0)).sqrt();
        assert_eq!(ci.mean, 0.5);
        assert!((ci.lower - (0.5 - 1.96 * sd)).abs() < 1e-12);
        assert!((ci.upper - (0.5 + 1.96 * sd)).abs() < 1e-12);
    }

    #[test]
    fn interval_is_clamped_for_skewed_beliefs() {
        let belief = BetaBelief::new(1.0, 4.0).expect("valid");
        let ci = belief.confidence_interval();
        assert_eq!(ci.lower, 0.0);
        assert!(ci.upper < 1.0);
    }

    #[test]
    fn sample_mean_tracks_beta_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        for belief in [
            BetaBelief::new(2.0, 2.0).expect("valid"),
            BetaBelief::new(1.0, 4.0).expect("valid"),
            BetaBelief::new(0.5, 3.0).expect("valid"),
            BetaBelief::new(12.0, 3.0).expect("valid"),
        ] {
            let n = 20_000;
            let total: f64 = (0..n).map(|_| belief.sample(&mut rng)).sum();
            let mean = total / n as f64;
            assert!((mean - belief.mean()).abs() < 0.02, "{belief:?} -> {mean}");
        }
    }
}
