//! Two-parameter Weibull fitting (location pinned at 0) by maximum likelihood.
//!
//! With the location fixed, the likelihood can be profiled over the scale λ, leaving a single
//! score equation in the shape k:
//!
//! ```text
//! g(k) = Σ xᵢᵏ ln xᵢ / Σ xᵢᵏ − 1/k − mean(ln xᵢ) = 0
//! ```
//!
//! g is strictly increasing, negative as k → 0 and positive for large k whenever the sample isn't
//! constant, so the root is unique.  It is found with Newton steps kept inside a shrinking bracket
//! (falling back to bisection when a step leaves it), after which λ = (mean xᵢᵏ)^(1/k).
use bs_core::errors::FitError;
use rand::Rng;
use rand_distr::{
    Distribution,
    Weibull,
    WeibullError,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    instrument,
};

use crate::config::FitConfig;

/// Parameters of a Weibull distribution in the (shape, location, scale) convention.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeibullParams {
    /// Shape k; 1 is the exponential distribution.
    pub shape: f64,
    /// Location shift; always 0 for fitted models.
    pub location: f64,
    /// Scale λ, in seconds.
    pub scale: f64,
}

impl WeibullParams {
    /// Parameters with the location fixed at zero.
    pub const fn new(shape: f64, scale: f64) -> Self {
        Self { shape, location: 0.0, scale }
    }

    /// A sampler for these parameters; fails unless shape and scale are positive.
    pub fn sampler(&self) -> Result<WeibullSampler, WeibullError> {
        Ok(WeibullSampler {
            dist: Weibull::new(self.scale, self.shape)?,
            location: self.location,
        })
    }

    /// Maximum-likelihood fit to `samples` with location 0.
    ///
    /// Non-positive and non-finite values carry no likelihood information under a zero location
    /// and are dropped before anything else is checked.
    #[instrument(level = "debug", skip(samples, config), fields(n = samples.len()))]
    pub fn fit(samples: &[f64], config: &FitConfig) -> Result<Self, FitError> {
        let xs: Vec<f64> = samples.iter().copied().filter(|x| x.is_finite() && *x > 0.0).collect();
        if xs.is_empty() {
            return Err(FitError::EmptySample);
        }
        if xs.len() < config.min_samples.max(1) {
            return Err(FitError::InsufficientSamples { found: xs.len(), need: config.min_samples });
        }

        let max = xs.iter().copied().fold(f64::MIN, f64::max);
        let min = xs.iter().copied().fold(f64::MAX, f64::min);
        if max - min <= f64::EPSILON * max {
            return Err(FitError::Degenerate(xs.len()));
        }

        // Working with ln(x / max) keeps every xᵢᵏ in (0, 1], so nothing overflows for large k.
        let logs: Vec<f64> = xs.iter().map(|x| (x / max).ln()).collect();
        let shape = solve_shape(&logs, config)?;

        #[allow(clippy::cast_precision_loss)]
        let mean_pow = logs.iter().map(|l| (shape * l).exp()).sum::<f64>() / logs.len() as f64;
        let scale = max * mean_pow.powf(shape.recip());

        debug!(shape, scale, "fitted weibull");
        Ok(Self::new(shape, scale))
    }
}

/// A ready-to-draw Weibull distribution.
#[derive(Clone, Debug)]
pub struct WeibullSampler {
    /// Underlying two-parameter distribution.
    dist: Weibull<f64>,
    /// Added to every draw.
    location: f64,
}

impl WeibullSampler {
    /// One draw.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.location + self.dist.sample(rng)
    }
}

/// The score g(k) and its derivative g'(k) for log-samples `logs` (all ≤ 0).
fn score(logs: &[f64], mean_log: f64, k: f64) -> (f64, f64) {
    let (s0, s1, s2) = logs.iter().fold((0.0, 0.0, 0.0), |(s0, s1, s2), &l| {
        let w = (k * l).exp();
        (s0 + w, w.mul_add(l, s1), (w * l).mul_add(l, s2))
    });
    let a = s1 / s0;
    let g = a - k.recip() - mean_log;
    let dg = a.mul_add(-a, s2 / s0) + (k * k).recip();
    (g, dg)
}

/// Root of the profile score equation in the shape parameter.
fn solve_shape(logs: &[f64], config: &FitConfig) -> Result<f64, FitError> {
    #[allow(clippy::cast_precision_loss)]
    let n = logs.len() as f64;
    let mean_log = logs.iter().sum::<f64>() / n;
    let var_log = logs.iter().map(|l| (l - mean_log).powi(2)).sum::<f64>() / n;

    // Moment-style starting point: sd(ln x) = π / (k √6) for a Weibull.
    let k0 = std::f64::consts::PI / (6.0 * var_log).sqrt();
    let mut iterations = 0;

    let (mut lo, mut hi) = (k0, k0);
    while score(logs, mean_log, lo).0 > 0.0 {
        lo /= 2.0;
        iterations += 1;
        if iterations >= config.max_iterations {
            return Err(FitError::NoConvergence(iterations));
        }
    }
    while score(logs, mean_log, hi).0 < 0.0 {
        hi *= 2.0;
        iterations += 1;
        if iterations >= config.max_iterations {
            return Err(FitError::NoConvergence(iterations));
        }
    }

    let mut k = k0.clamp(lo, hi);
    while iterations < config.max_iterations {
        iterations += 1;
        let (g, dg) = score(logs, mean_log, k);
        if g < 0.0 {
            lo = k;
        } else {
            hi = k;
        }

        let newton = k - g / dg;
        let next = if newton.is_finite() && newton > lo && newton < hi { newton } else { 0.5 * (lo + hi) };

        if (next - k).abs() <= config.tolerance * k || (hi - lo) <= config.tolerance * k {
            return Ok(next);
        }
        k = next;
    }

    Err(FitError::NoConvergence(iterations))
}
