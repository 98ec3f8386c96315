//! Per-domain dwell-time models.
//!
//! Two samples are collected for every domain:
//! - *domain dwell*: time from a domain change into the domain until the next domain change;
//! - *route interval*: time between consecutive accesses that stay on the domain.
//!
//! Each is fitted independently with [`WeibullParams::fit`]; see [`FallbackPolicy`] for what
//! happens when a sample can't support a fit.
use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::fmt;

use bs_core::domain::Domain;
use bs_core::errors::FitError;
use bs_store::{
    ChangeType,
    Event,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    info,
    instrument,
    warn,
};

use crate::config::{
    FallbackPolicy,
    FitConfig,
};
use crate::weibull::WeibullParams;

/// Which of the two nested renewal processes a sample or model belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellLevel {
    /// Time spent on a domain.
    Domain,
    /// Time between route changes within a domain.
    Route,
}

impl fmt::Display for DwellLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain => f.write_str("domain"),
            Self::Route => f.write_str("route"),
        }
    }
}

/// Observed durations, in seconds, grouped by domain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DwellSamples {
    /// Every domain seen in the events, whether or not it has samples.
    domains: BTreeSet<Domain>,
    /// Domain-dwell durations.
    domain: BTreeMap<Domain, Vec<f64>>,
    /// Route-change intervals.
    route: BTreeMap<Domain, Vec<f64>>,
}

impl DwellSamples {
    /// Collect both samples from a derived event sequence.
    ///
    /// The last domain change has no following change, so it contributes no domain-dwell sample.
    pub fn from_events(events: &[Event]) -> Self {
        let changes: Vec<&Event> = Event::domain_changes(events).collect();

        let domain = changes.windows(2).fold(BTreeMap::<_, Vec<_>>::new(), |mut acc, pair| {
            acc.entry(pair[0].domain.clone()).or_default().push(pair[0].seconds_until(pair[1]));
            acc
        });

        let route = events
            .iter()
            .filter(|e| e.change_type == ChangeType::RouteChange)
            .fold(BTreeMap::<_, Vec<_>>::new(), |mut acc, e| {
                acc.entry(e.domain.clone()).or_default().push(e.time_delta);
                acc
            });

        let domains = events.iter().map(|e| e.domain.clone()).collect();
        Self { domains, domain, route }
    }

    /// Every domain seen, in sorted order.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter()
    }

    /// Durations observed for `domain` at `level`; empty if there were none.
    pub fn get(&self, domain: &Domain, level: DwellLevel) -> &[f64] {
        let samples = match level {
            DwellLevel::Domain => &self.domain,
            DwellLevel::Route => &self.route,
        };
        samples.get(domain).map_or(&[][..], Vec::as_slice)
    }

    /// Every duration at `level`, across all domains.
    pub fn pooled(&self, level: DwellLevel) -> Vec<f64> {
        let samples = match level {
            DwellLevel::Domain => &self.domain,
            DwellLevel::Route => &self.route,
        };
        samples.values().flatten().copied().collect()
    }
}

/// Fitted dwell and route distributions for one domain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DwellModel {
    /// Distribution of visit lengths.
    pub domain: WeibullParams,
    /// Distribution of intervals between route changes.
    pub route: WeibullParams,
}

/// A domain/level whose own sample could not be fitted.
#[derive(Clone, Debug, PartialEq)]
pub struct FitFailure {
    /// The affected domain.
    pub domain: Domain,
    /// Which sample failed.
    pub level: DwellLevel,
    /// Why it failed.
    pub error: FitError,
    /// Whether a pooled model was substituted; if not, the domain was excluded.
    pub pooled: bool,
}

impl fmt::Display for FitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.pooled { "using pooled model" } else { "excluded" };
        write!(f, "{} {} fit failed ({}), {outcome}", self.domain, self.level, self.error)
    }
}

/// Immutable mapping from domain to its fitted [`DwellModel`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DwellModels {
    /// Models by domain.
    models: BTreeMap<Domain, DwellModel>,
}

/// Output of [`DwellModels::fit`]: the usable models plus every per-domain failure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FitReport {
    /// Models for every simulatable domain.
    pub models: DwellModels,
    /// Domain/level pairs whose own fit failed.
    pub failures: Vec<FitFailure>,
}

impl DwellModels {
    /// Wrap already-known models, e.g. ones chosen by hand.
    pub fn from_models(models: impl IntoIterator<Item = (Domain, DwellModel)>) -> Self {
        Self { models: models.into_iter().collect() }
    }

    /// Fit both levels for every domain in `samples`.
    ///
    /// The per-domain fits are independent and run in parallel.  Failures never abort the fit;
    /// they are resolved according to `config.fallback` and reported in the returned
    /// [`FitReport`].
    #[instrument(skip_all, fields(domains = samples.domains.len(), fallback = ?config.fallback))]
    pub fn fit(samples: &DwellSamples, config: &FitConfig) -> FitReport {
        let pooled = |level| match config.fallback {
            FallbackPolicy::Pooled => WeibullParams::fit(&samples.pooled(level), config).ok(),
            FallbackPolicy::Exclude => None,
        };
        let pooled_domain = pooled(DwellLevel::Domain);
        let pooled_route = pooled(DwellLevel::Route);

        let fits: Vec<_> = samples
            .domains
            .par_iter()
            .map(|d| {
                let domain_fit = WeibullParams::fit(samples.get(d, DwellLevel::Domain), config);
                let route_fit = WeibullParams::fit(samples.get(d, DwellLevel::Route), config);
                (d, domain_fit, route_fit)
            })
            .collect();

        let mut report = FitReport::default();
        for (d, domain_fit, route_fit) in fits {
            let domain = resolve(d, DwellLevel::Domain, domain_fit, pooled_domain, &mut report.failures);
            let route = resolve(d, DwellLevel::Route, route_fit, pooled_route, &mut report.failures);
            if let (Some(domain), Some(route)) = (domain, route) {
                report.models.models.insert(d.clone(), DwellModel { domain, route });
            }
        }

        for failure in &report.failures {
            warn!("{failure}");
        }
        info!(
            fitted = report.models.len(),
            failures = report.failures.len(),
            "fitted dwell-time models"
        );
        report
    }

    /// The model for `domain`, if it is simulatable.
    pub fn get(&self, domain: &Domain) -> Option<&DwellModel> {
        self.models.get(domain)
    }

    /// Whether `domain` has a model.
    pub fn contains(&self, domain: &Domain) -> bool {
        self.models.contains_key(domain)
    }

    /// Simulatable domains, in sorted order.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.models.keys()
    }

    /// Number of simulatable domains.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True when no domain could be fitted.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Pick the model for one domain/level, recording a failure if its own fit didn't work.
fn resolve(
    domain: &Domain,
    level: DwellLevel,
    fit: Result<WeibullParams, FitError>,
    pooled: Option<WeibullParams>,
    failures: &mut Vec<FitFailure>,
) -> Option<WeibullParams> {
    match fit {
        Ok(params) => Some(params),
        Err(error) => {
            failures.push(FitFailure {
                domain: domain.clone(),
                level,
                error,
                pooled: pooled.is_some(),
            });
            pooled
        },
    }
}
