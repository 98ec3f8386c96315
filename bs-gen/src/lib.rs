#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
)]
#![warn(missing_docs)]

//! # bs-gen – hazard-model fitting and synthetic browsing-session generation
//!
//! bs-gen turns a recorded browsing log into a generative model of how a user moves between
//! websites and how long they stay, then samples new sessions from it.
//!
//! ## Pipeline overview
//! 1. Transition model ([`TransitionMatrix`](crate::transition::TransitionMatrix)) – the ordered
//!    sequence of domain changes is counted into a first-order Markov chain whose rows are
//!    normalised so that the outgoing probabilities of each domain sum to 1.
//! 2. Dwell-time models ([`DwellModels`](crate::fitter::DwellModels)) – for every domain, two
//!    Weibull distributions (location fixed at 0) are fitted by maximum likelihood: one to the time
//!    spent on the domain, one to the intervals between route changes inside it.  Domains whose
//!    samples can't support a fit are either excluded or given a pooled model.
//! 3. Simulation ([`SessionSimulator`](crate::simulation::SessionSimulator)) – a two-level renewal
//!    process: draw a visit length, fill it with route changes until the next draw would overrun
//!    the visit, then walk the Markov chain to the next domain.
//!
//! Every random draw comes from a caller-supplied generator, so a seed fully determines a run.
//! Structured records are pushed to a [`SimulationSink`](crate::sink::SimulationSink) as they are
//! produced; turning them into text is the sink's business.

pub mod config;
pub mod fitter;
pub mod model;
pub mod simulation;
pub mod sink;
pub mod transition;
pub mod weibull;

pub use config::{
    FallbackPolicy,
    FitConfig,
    GenConfig,
    SimulationConfig,
};
pub use fitter::{
    DwellLevel,
    DwellModel,
    DwellModels,
    DwellSamples,
    FitFailure,
    FitReport,
};
pub use model::BrowsingModel;
pub use simulation::{
    SessionSimulator,
    Trajectory,
    Visit,
};
pub use sink::{
    JsonLinesSink,
    RecordKind,
    SimulationRecord,
    SimulationSink,
    TextSink,
    VecSink,
};
pub use transition::{
    TransitionMatrix,
    TransitionMatrixBuilder,
};
pub use weibull::WeibullParams;

#[cfg(test)]
mod tests;
