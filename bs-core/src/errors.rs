use thiserror::Error;

use crate::domain::Domain;

/// Row-scoped failures while reading a browsing log; the offending row is skipped.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The row doesn't split into `timestamp,info,type`.
    #[error("line {line}: expected 3 columns, found {found}")]
    ColumnCount { line: usize, found: usize },

    /// A quoted field runs to the end of the line.
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },

    /// The first column isn't a timestamp in any accepted format.
    #[error("line {line}: could not parse timestamp {value:?}")]
    Timestamp { line: usize, value: String },

    /// Not an `http(s)://host...` URL.
    #[error("{0:?} is not an http(s) URL")]
    InvalidUrl(String),
}

/// Failures fitting a dwell-time distribution to one sample.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FitError {
    /// Nothing left after dropping zero, negative and non-finite durations.
    #[error("sample contains no usable (positive, finite) durations")]
    EmptySample,

    /// Fewer usable durations than `min_samples`.
    #[error("need at least {need} usable durations, found {found}")]
    InsufficientSamples { found: usize, need: usize },

    /// Every duration is the same; the likelihood has no maximum.
    #[error("all {0} durations are identical, shape is unbounded")]
    Degenerate(usize),

    /// The shape solver ran out of iterations.
    #[error("maximum likelihood estimate did not converge after {0} iterations")]
    NoConvergence(usize),
}

/// Run-scoped failures; any of these ends the in-progress trajectory.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The current domain has no fitted dwell model.
    #[error("no dwell model for domain {0}")]
    UnknownDomain(Domain),

    /// Another visit is needed but the current domain's transition row is all zero.
    #[error("domain {0} has no outgoing transitions, cannot continue the session")]
    AbsorbingDomain(Domain),

    /// A single visit used up its route-draw budget.
    #[error("route sampling for domain {domain} exceeded {cap} events in a single visit")]
    IterationCapExceeded { domain: Domain, cap: usize },

    /// Stored Weibull parameters can't be sampled from.
    #[error("invalid dwell model for domain {domain}: {reason}")]
    InvalidModel { domain: Domain, reason: String },

    /// The cancel flag was set or the deadline passed.
    #[error("run cancelled after {completed} visits")]
    Cancelled { completed: usize },

    /// The sink failed to write or flush.
    #[error("could not write simulation record")]
    Sink(#[from] std::io::Error),
}
