//! Tunables for fitting and simulation, loadable from a YAML file.
//!
//! Every field has a default, so a config file only needs to mention what it changes:
//!
//! ```yaml
//! fit:
//!   min_samples: 5
//!   fallback: exclude
//! simulation:
//!   visits: 50
//!   seed: 1234
//! ```
use std::path::Path;
use std::time::Duration;

use anyhow::{
    bail,
    Context,
};
use clap::ValueEnum;
use derive_setters::Setters;
use serde::{
    Deserialize,
    Serialize,
};

/// What to do with a domain whose dwell-time sample can't be fitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Drop the domain from the simulatable set.
    Exclude,
    /// Use the distribution fitted to all domains' samples at the same level.
    #[default]
    Pooled,
}

/// Settings for the Weibull maximum-likelihood fits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Setters)]
#[serde(default)]
pub struct FitConfig {
    /// Smallest number of usable durations a fit will accept.
    pub min_samples: usize,
    /// Newton/bisection iterations allowed before giving up on the shape estimate.
    pub max_iterations: usize,
    /// Relative step size at which the shape estimate counts as converged.
    pub tolerance: f64,
    /// Handling of domains whose fit fails.
    pub fallback: FallbackPolicy,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_samples: 2,
            max_iterations: 200,
            tolerance: 1e-10,
            fallback: FallbackPolicy::default(),
        }
    }
}

/// Settings for a single simulated session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Setters)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of domain visits per session.
    pub visits: usize,
    /// Upper bound on route-interval draws inside one visit.
    pub max_route_events_per_visit: usize,
    /// Seed for the random generator; drawn at random when absent.
    #[setters(strip_option)]
    pub seed: Option<u64>,
    /// Wall-clock budget for one session, in seconds.
    #[setters(strip_option)]
    pub deadline_secs: Option<f64>,
}

impl SimulationConfig {
    /// The session deadline, rejecting negative, infinite or NaN `deadline_secs`.
    pub fn deadline(&self) -> anyhow::Result<Option<Duration>> {
        let Some(secs) = self.deadline_secs else {
            return Ok(None);
        };
        match Duration::try_from_secs_f64(secs) {
            Ok(deadline) => Ok(Some(deadline)),
            Err(_) => bail!("deadline_secs must be a finite, non-negative number of seconds, got {secs}"),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            visits: 10,
            max_route_events_per_visit: 10_000,
            seed: None,
            deadline_secs: None,
        }
    }
}

/// Top-level configuration file layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Fitting settings.
    pub fit: FitConfig,
    /// Simulation settings.
    pub simulation: SimulationConfig,
}

impl GenConfig {
    /// Read a YAML config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            serde_yaml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate().with_context(|| format!("validating config {}", path.display()))?;
        Ok(config)
    }

    /// Check values that deserialize fine but can't be used.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.simulation.deadline()?;
        Ok(())
    }
}
