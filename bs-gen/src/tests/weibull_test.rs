use assertables::*;
use bs_core::errors::FitError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::*;

use crate::config::FitConfig;
use crate::weibull::*;

fn draws(params: WeibullParams, k: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let sampler = params.sampler().unwrap();
    (0..k).map(|_| sampler.sample(&mut rng)).collect()
}

#[rstest]
#[case(500, 0.15)]
#[case(2_000, 0.08)]
#[case(10_000, 0.05)]
fn test_fit_recovers_parameters(#[case] k: usize, #[case] tolerance: f64) {
    let truth = WeibullParams::new(2.0, 5.0);
    let fitted = WeibullParams::fit(&draws(truth, k, 17), &FitConfig::default()).unwrap();

    assert_in_delta!(fitted.shape, 2.0, 2.0 * tolerance);
    assert_in_delta!(fitted.scale, 5.0, 5.0 * tolerance);
    assert_eq!(fitted.location, 0.0);
}

#[rstest]
fn test_fit_exponential() {
    let fitted = WeibullParams::fit(&draws(WeibullParams::new(1.0, 30.0), 10_000, 3), &FitConfig::default()).unwrap();

    assert_in_delta!(fitted.shape, 1.0, 0.05);
    assert_in_delta!(fitted.scale, 30.0, 1.5);
}

#[rstest]
fn test_fit_scale_equivariant() {
    let xs = draws(WeibullParams::new(0.7, 2.0), 1_000, 5);
    let scaled: Vec<f64> = xs.iter().map(|x| x * 1000.0).collect();

    let a = WeibullParams::fit(&xs, &FitConfig::default()).unwrap();
    let b = WeibullParams::fit(&scaled, &FitConfig::default()).unwrap();

    assert_in_delta!(a.shape, b.shape, 1e-6);
    assert_in_delta!(a.scale * 1000.0, b.scale, 1e-3);
}

#[rstest]
fn test_fit_ignores_non_positive() {
    let xs = draws(WeibullParams::new(2.0, 5.0), 1_000, 9);
    let mut noisy = xs.clone();
    noisy.extend([0.0, -4.0, f64::NAN, f64::INFINITY]);

    let config = FitConfig::default();
    assert_eq!(WeibullParams::fit(&noisy, &config), WeibullParams::fit(&xs, &config));
}

#[rstest]
#[case(&[], FitError::EmptySample)]
#[case(&[0.0, -1.0], FitError::EmptySample)]
#[case(&[3.0], FitError::InsufficientSamples { found: 1, need: 2 })]
#[case(&[3.0, 0.0], FitError::InsufficientSamples { found: 1, need: 2 })]
#[case(&[2.0, 2.0, 2.0], FitError::Degenerate(3))]
fn test_fit_errors(#[case] samples: &[f64], #[case] expected: FitError) {
    assert_eq!(WeibullParams::fit(samples, &FitConfig::default()).unwrap_err(), expected);
}

#[rstest]
fn test_fit_min_samples_configurable() {
    let config = FitConfig::default().min_samples(5);
    let err = WeibullParams::fit(&[1.0, 2.0, 3.0], &config).unwrap_err();
    assert_eq!(err, FitError::InsufficientSamples { found: 3, need: 5 });
}

#[rstest]
fn test_fit_no_convergence() {
    let config = FitConfig::default().max_iterations(1);
    let err = WeibullParams::fit(&draws(WeibullParams::new(2.0, 5.0), 100, 1), &config).unwrap_err();
    assert!(matches!(err, FitError::NoConvergence(_)));
}

#[rstest]
#[case(WeibullParams::new(0.0, 1.0))]
#[case(WeibullParams::new(1.0, 0.0))]
#[case(WeibullParams::new(-1.0, 1.0))]
#[case(WeibullParams::new(f64::NAN, 1.0))]
fn test_sampler_rejects_bad_params(#[case] params: WeibullParams) {
    assert!(params.sampler().is_err());
}

#[rstest]
fn test_sampler_mean() {
    // mean of Weibull(k = 1, λ) is λ
    let xs = draws(WeibullParams::new(1.0, 5.0), 20_000, 11);
    #[allow(clippy::cast_precision_loss)]
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    assert_in_delta!(mean, 5.0, 0.2);
    assert!(xs.iter().all(|x| *x >= 0.0));
}
