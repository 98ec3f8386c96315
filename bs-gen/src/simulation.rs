//! Synthetic session generation.
//!
//! A session is a two-level renewal process.  Each visit draws its length `D` from the current
//! domain's dwell distribution, then repeatedly draws route intervals `R`, emitting a route change
//! at `t + R` while `t + R < D`.  The first draw that would reach `D` is discarded and the visit
//! ends.  The next domain comes from the transition matrix row of the current one.
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::Arc;
use std::time::{
    Duration,
    Instant,
};

use bs_core::domain::Domain;
use bs_core::errors::SimulationError;
use rand::Rng;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
    instrument,
    warn,
};

use crate::config::SimulationConfig;
use crate::model::BrowsingModel;
use crate::sink::{
    SimulationRecord,
    SimulationSink,
};
use crate::weibull::{
    WeibullParams,
    WeibullSampler,
};

/// One simulated stay on a domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Domain visited.
    pub domain: Domain,
    /// Visit length in seconds.
    pub duration: f64,
    /// Offsets of route changes from the start of the visit; increasing and all below `duration`.
    pub route_offsets: Vec<f64>,
}

/// The ordered visits of one simulated session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Visits in order.
    visits: Vec<Visit>,
}

impl Trajectory {
    /// Visits in order.
    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// Number of visits.
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// True for a session with no visits.
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Domains in visiting order.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.visits.iter().map(|v| &v.domain)
    }
}

/// Runs sessions against a borrowed [`BrowsingModel`].
pub struct SessionSimulator<'a> {
    /// The model being sampled; never modified.
    model: &'a BrowsingModel,
    /// Visits per session.
    visits: usize,
    /// Route-interval draws allowed per visit.
    max_route_events: usize,
    /// Wall-clock budget per session.
    deadline: Option<Duration>,
    /// Externally settable stop flag.
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> SessionSimulator<'a> {
    /// A simulator using `config`'s visit count, route cap and deadline.  The seed in `config` is
    /// not used here; the caller owns the random generator.  An invalid deadline is logged and
    /// ignored; use [`SimulationConfig::deadline`] to reject it up front.
    pub fn new(model: &'a BrowsingModel, config: &SimulationConfig) -> Self {
        Self {
            model,
            visits: config.visits,
            max_route_events: config.max_route_events_per_visit,
            deadline: config.deadline().unwrap_or_else(|err| {
                warn!(%err, "ignoring deadline");
                None
            }),
            cancel: None,
        }
    }

    /// Stop the session early (with [`SimulationError::Cancelled`]) once `flag` is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Simulate one session starting at `start`, pushing every record to `sink` as it is drawn.
    /// The sink is finished either way; a session error takes precedence over a failed flush.
    ///
    /// Stops with an error if the current domain has no dwell model, if more visits are needed but
    /// the current domain has no outgoing transitions, if a visit needs more than the allowed
    /// number of route draws, or if the session is cancelled.  No continuation is drawn after the
    /// final visit.
    #[instrument(skip_all, fields(start = %start, visits = self.visits))]
    pub fn run<R, S>(&self, start: &Domain, rng: &mut R, sink: &mut S) -> Result<Trajectory, SimulationError>
    where
        R: Rng + ?Sized,
        S: SimulationSink + ?Sized,
    {
        let result = self.walk(start, rng, sink);
        let finished = sink.finish();
        let trajectory = result?;
        finished?;
        Ok(trajectory)
    }

    /// The visit loop behind [`SessionSimulator::run`].
    fn walk<R, S>(&self, start: &Domain, rng: &mut R, sink: &mut S) -> Result<Trajectory, SimulationError>
    where
        R: Rng + ?Sized,
        S: SimulationSink + ?Sized,
    {
        let started = Instant::now();
        let mut trajectory = Trajectory::default();
        let mut current = start.clone();

        for completed in 0..self.visits {
            if self.should_stop(started) {
                return Err(SimulationError::Cancelled { completed });
            }

            let model = self
                .model
                .dwell()
                .get(&current)
                .ok_or_else(|| SimulationError::UnknownDomain(current.clone()))?;
            let dwell = sampler(&current, &model.domain)?;
            let route = sampler(&current, &model.route)?;

            let duration = dwell.sample(rng);
            sink.record(&SimulationRecord::domain(&current, duration))?;
            let route_offsets = fill_visit(&current, duration, &route, self.max_route_events, rng, sink)?;
            debug!(domain = %current, duration, routes = route_offsets.len(), "visit");

            trajectory.visits.push(Visit { domain: current.clone(), duration, route_offsets });

            if completed + 1 < self.visits {
                current = self.model.transitions().sample_next(&current, rng)?;
            }
        }

        info!(visits = trajectory.len(), "session complete");
        Ok(trajectory)
    }

    /// Whether the deadline has passed or the cancel flag is set.
    fn should_stop(&self, started: Instant) -> bool {
        self.deadline.is_some_and(|d| started.elapsed() >= d)
            || self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Build a sampler, reporting bad parameters against `domain`.
fn sampler(domain: &Domain, params: &WeibullParams) -> Result<WeibullSampler, SimulationError> {
    params.sampler().map_err(|err| SimulationError::InvalidModel {
        domain: domain.clone(),
        reason: format!("{err:?} (shape {}, scale {})", params.shape, params.scale),
    })
}

/// Draw route changes inside a visit of length `horizon` until a draw would reach it.
///
/// At most `cap` draws are made, counting the discarded final one; running out is an error
/// rather than a silently truncated visit.  Returns the offsets of the emitted route changes.
pub(crate) fn fill_visit<R, S>(
    domain: &Domain,
    horizon: f64,
    route: &WeibullSampler,
    cap: usize,
    rng: &mut R,
    sink: &mut S,
) -> Result<Vec<f64>, SimulationError>
where
    R: Rng + ?Sized,
    S: SimulationSink + ?Sized,
{
    let mut offsets = Vec::new();
    let mut elapsed = 0.0;

    for _ in 0..cap {
        let interval = route.sample(rng);
        if elapsed + interval >= horizon {
            return Ok(offsets);
        }
        elapsed += interval;
        offsets.push(elapsed);
        sink.record(&SimulationRecord::route(domain, interval))?;
    }

    Err(SimulationError::IterationCapExceeded { domain: domain.clone(), cap })
}
