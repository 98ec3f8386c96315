use bs_core::errors::FitError;
use bs_store::Event;
use rstest::*;
use tracing_test::traced_test;

use super::{
    dom,
    events,
};
use crate::config::{
    FallbackPolicy,
    FitConfig,
};
use crate::fitter::*;
use crate::weibull::WeibullParams;

#[fixture]
fn log() -> Vec<Event> {
    events(&[
        (0.0, "https://a.com/"),
        (4.0, "https://a.com/x"),
        (10.0, "https://b.com/"),
        (25.0, "https://a.com/"),
        (27.0, "https://a.com/y"),
        (30.0, "https://a.com/z"),
        (45.0, "https://c.com/"),
        (50.0, "https://c.com/p"),
    ])
}

fn approx(got: &[f64], want: &[f64]) -> bool {
    got.len() == want.len() && got.iter().zip(want).all(|(g, w)| (g - w).abs() < 1e-9)
}

#[rstest]
fn test_samples_from_events(log: Vec<Event>) {
    let samples = DwellSamples::from_events(&log);

    assert!(approx(samples.get(&dom("a"), DwellLevel::Domain), &[10.0, 20.0]));
    assert!(approx(samples.get(&dom("b"), DwellLevel::Domain), &[15.0]));
    assert!(samples.get(&dom("c"), DwellLevel::Domain).is_empty());

    assert!(approx(samples.get(&dom("a"), DwellLevel::Route), &[4.0, 2.0, 3.0]));
    assert!(samples.get(&dom("b"), DwellLevel::Route).is_empty());
    assert!(approx(samples.get(&dom("c"), DwellLevel::Route), &[5.0]));

    assert_eq!(samples.domains().collect::<Vec<_>>(), [&dom("a"), &dom("b"), &dom("c")]);
    assert_eq!(samples.pooled(DwellLevel::Domain).len(), 3);
    assert_eq!(samples.pooled(DwellLevel::Route).len(), 4);
}

#[rstest]
fn test_fit_exclude(log: Vec<Event>) {
    let config = FitConfig::default().fallback(FallbackPolicy::Exclude);
    let report = DwellModels::fit(&DwellSamples::from_events(&log), &config);

    assert_eq!(report.models.domains().collect::<Vec<_>>(), [&dom("a")]);
    assert!(!report.models.contains(&dom("b")));

    let failed: Vec<_> = report.failures.iter().map(|f| (f.domain.clone(), f.level, f.error.clone(), f.pooled)).collect();
    assert_eq!(
        failed,
        [
            (dom("b"), DwellLevel::Domain, FitError::InsufficientSamples { found: 1, need: 2 }, false),
            (dom("b"), DwellLevel::Route, FitError::EmptySample, false),
            (dom("c"), DwellLevel::Domain, FitError::EmptySample, false),
            (dom("c"), DwellLevel::Route, FitError::InsufficientSamples { found: 1, need: 2 }, false),
        ]
    );
}

#[rstest]
#[traced_test]
fn test_fit_failures_are_logged(log: Vec<Event>) {
    let config = FitConfig::default().fallback(FallbackPolicy::Exclude);
    let report = DwellModels::fit(&DwellSamples::from_events(&log), &config);

    assert_eq!(report.models.len(), 1);
    assert!(logs_contain("https://b.com domain fit failed"));
    assert!(logs_contain("https://c.com route fit failed"));
}

#[rstest]
fn test_fit_pooled(log: Vec<Event>) {
    let samples = DwellSamples::from_events(&log);
    let config = FitConfig::default();
    let report = DwellModels::fit(&samples, &config);

    assert_eq!(report.models.len(), 3);
    assert_eq!(report.failures.len(), 4);
    assert!(report.failures.iter().all(|f| f.pooled));

    let pooled_domain = WeibullParams::fit(&samples.pooled(DwellLevel::Domain), &config).unwrap();
    let own_a = WeibullParams::fit(samples.get(&dom("a"), DwellLevel::Domain), &config).unwrap();
    assert_eq!(report.models.get(&dom("b")).unwrap().domain, pooled_domain);
    assert_eq!(report.models.get(&dom("a")).unwrap().domain, own_a);
}

#[rstest]
fn test_fit_is_deterministic(log: Vec<Event>) {
    let samples = DwellSamples::from_events(&log);
    let config = FitConfig::default();
    assert_eq!(DwellModels::fit(&samples, &config), DwellModels::fit(&samples, &config));
}

#[rstest]
fn test_fit_empty() {
    let report = DwellModels::fit(&DwellSamples::default(), &FitConfig::default());
    assert!(report.models.is_empty());
    assert!(report.failures.is_empty());
}

#[rstest]
fn test_failure_display() {
    let failure = FitFailure {
        domain: dom("b"),
        level: DwellLevel::Route,
        error: FitError::EmptySample,
        pooled: false,
    };
    assert_eq!(
        failure.to_string(),
        "https://b.com route fit failed (sample contains no usable (positive, finite) durations), excluded"
    );
}
