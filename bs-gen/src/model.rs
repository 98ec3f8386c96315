//! The fitted browsing model the simulator walks.
use bs_store::Event;
use tracing::{
    info,
    instrument,
};

use crate::config::FitConfig;
use crate::fitter::{
    DwellModels,
    DwellSamples,
    FitFailure,
};
use crate::transition::TransitionMatrix;

/// Transition matrix plus dwell-time models, restricted to the same set of domains.
///
/// There is no way to mutate a `BrowsingModel` after it is built; simulations only ever borrow
/// it.
#[derive(Clone, Debug, PartialEq)]
pub struct BrowsingModel {
    /// Next-domain probabilities, over simulatable domains only.
    transitions: TransitionMatrix,
    /// Dwell and route distributions per domain.
    dwell: DwellModels,
}

impl BrowsingModel {
    /// Combine a transition matrix with dwell models.  Domains without a dwell model are removed
    /// from the matrix, so the simulator can never move into a domain it can't simulate.
    pub fn new(transitions: &TransitionMatrix, dwell: DwellModels) -> Self {
        let transitions = transitions.restricted_to(|d| dwell.contains(d));
        Self { transitions, dwell }
    }

    /// Fit the whole model from a derived event sequence.  Returns the model and every per-domain
    /// fit failure (the affected domains were pooled or excluded per `config.fallback`).
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn fit(events: &[Event], config: &FitConfig) -> (Self, Vec<FitFailure>) {
        let transitions = TransitionMatrix::from_domain_changes(events);
        let report = DwellModels::fit(&DwellSamples::from_events(events), config);
        let model = Self::new(&transitions, report.models);

        info!(
            observed = transitions.domains().len(),
            simulatable = model.dwell.len(),
            "built browsing model"
        );
        (model, report.failures)
    }

    /// Next-domain probabilities.
    pub const fn transitions(&self) -> &TransitionMatrix {
        &self.transitions
    }

    /// Per-domain dwell-time models.
    pub const fn dwell(&self) -> &DwellModels {
        &self.dwell
    }
}
