//! First-order Markov model of domain-to-domain navigation.
//!
//! Rows are origins and columns are destinations, both when counting and when sampling: entry
//! `(i, j)` is the probability that a visit to domain `i` is followed by a visit to domain `j`.
use std::collections::{
    BTreeMap,
    HashMap,
};

use bs_core::domain::Domain;
use bs_core::errors::SimulationError;
use bs_store::Event;
use rand::distributions::{
    Distribution,
    WeightedIndex,
};
use rand::Rng;
use tracing::{
    debug,
    instrument,
};

/// Accumulates transition counts from an ordered sequence of domain changes.
#[derive(Debug, Default)]
pub struct TransitionMatrixBuilder {
    /// Domains in first-appearance order.
    domains: Vec<Domain>,
    /// Position of each domain in `domains`.
    index: HashMap<Domain, usize>,
    /// Observed `(origin, destination)` counts.
    counts: BTreeMap<(usize, usize), u64>,
    /// The most recently observed domain.
    last: Option<usize>,
}

impl TransitionMatrixBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next domain in the sequence, counting a transition from the previous one.
    pub fn observe(&mut self, domain: &Domain) {
        let next = self.intern(domain);
        if let Some(prev) = self.last {
            *self.counts.entry((prev, next)).or_default() += 1;
        }
        self.last = Some(next);
    }

    /// Record every domain in order.
    pub fn observe_all<'a>(&mut self, domains: impl IntoIterator<Item = &'a Domain>) -> &mut Self {
        for domain in domains {
            self.observe(domain);
        }
        self
    }

    /// Number of times `origin` was directly followed by `destination`.
    pub fn count(&self, origin: &Domain, destination: &Domain) -> u64 {
        match (self.index.get(origin), self.index.get(destination)) {
            (Some(&o), Some(&d)) => self.counts.get(&(o, d)).copied().unwrap_or(0),
            _ => 0,
        }
    }

    /// Normalise each row by its total and freeze the result.
    #[instrument(skip(self), fields(domains = self.domains.len(), pairs = self.counts.len()))]
    pub fn build(self) -> TransitionMatrix {
        let n = self.domains.len();
        let mut rows = vec![vec![0.0; n]; n];
        for (&(origin, destination), &count) in &self.counts {
            #[allow(clippy::cast_precision_loss)]
            let count = count as f64;
            rows[origin][destination] = count;
        }
        normalize_rows(&mut rows);

        TransitionMatrix { domains: self.domains, index: self.index, rows }
    }

    /// Index of `domain`, registering it if new.
    fn intern(&mut self, domain: &Domain) -> usize {
        if let Some(&i) = self.index.get(domain) {
            return i;
        }
        let i = self.domains.len();
        self.domains.push(domain.clone());
        self.index.insert(domain.clone(), i);
        i
    }
}

/// Scale every row with a positive total so it sums to 1.  Rows that sum to 0 stay all-zero; they
/// mark absorbing domains.
fn normalize_rows(rows: &mut [Vec<f64>]) {
    for row in rows {
        let total: f64 = row.iter().sum();
        if total <= 0.0 {
            continue;
        }
        for p in row.iter_mut() {
            *p /= total;
        }
    }
}

/// Row-stochastic transition probabilities between domains; immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionMatrix {
    /// Row/column labels, in first-appearance order.
    domains: Vec<Domain>,
    /// Position of each domain in `domains`.
    index: HashMap<Domain, usize>,
    /// `rows[origin][destination]`.
    rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Count consecutive pairs in the domain-change sub-sequence of `events`.
    pub fn from_domain_changes(events: &[Event]) -> Self {
        let mut builder = TransitionMatrixBuilder::new();
        builder.observe_all(Event::domain_changes(events).map(|e| &e.domain));
        builder.build()
    }

    /// Every domain with a row, in first-appearance order.
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Whether `domain` has a row at all.
    pub fn contains(&self, domain: &Domain) -> bool {
        self.index.contains_key(domain)
    }

    /// Probability of going from `origin` to `destination`; 0 for unknown domains.
    pub fn probability(&self, origin: &Domain, destination: &Domain) -> f64 {
        match (self.index.get(origin), self.index.get(destination)) {
            (Some(&o), Some(&d)) => self.rows[o][d],
            _ => 0.0,
        }
    }

    /// The non-zero destinations reachable from `origin`, with their probabilities.
    pub fn row(&self, origin: &Domain) -> Vec<(&Domain, f64)> {
        self.index.get(origin).map_or_else(Vec::new, |&o| {
            self.domains
                .iter()
                .zip(&self.rows[o])
                .filter(|&(_, &p)| p > 0.0)
                .map(|(d, &p)| (d, p))
                .collect()
        })
    }

    /// Sum of `origin`'s row, or `None` for an unknown domain.
    pub fn row_sum(&self, origin: &Domain) -> Option<f64> {
        self.index.get(origin).map(|&o| self.rows[o].iter().sum())
    }

    /// True when `origin` has no outgoing probability mass (including unknown domains).
    pub fn is_absorbing(&self, origin: &Domain) -> bool {
        self.row_sum(origin).map_or(true, |total| total <= 0.0)
    }

    /// Draw the domain that follows `origin`.
    pub fn sample_next<R: Rng + ?Sized>(&self, origin: &Domain, rng: &mut R) -> Result<Domain, SimulationError> {
        let row = match self.index.get(origin) {
            Some(&o) if !self.is_absorbing(origin) => &self.rows[o],
            _ => return Err(SimulationError::AbsorbingDomain(origin.clone())),
        };
        let dist = WeightedIndex::new(row).map_err(|_| SimulationError::AbsorbingDomain(origin.clone()))?;
        Ok(self.domains[dist.sample(rng)].clone())
    }

    /// A copy keeping only the domains for which `keep` holds, with rows renormalised over the
    /// surviving destinations.  Rows left with no mass become absorbing.
    #[instrument(skip(self, keep), fields(domains = self.domains.len()))]
    pub fn restricted_to(&self, keep: impl Fn(&Domain) -> bool) -> Self {
        let kept: Vec<usize> = (0..self.domains.len()).filter(|&i| keep(&self.domains[i])).collect();

        let domains: Vec<Domain> = kept.iter().map(|&i| self.domains[i].clone()).collect();
        let index = domains.iter().cloned().enumerate().map(|(i, d)| (d, i)).collect();
        let mut rows: Vec<Vec<f64>> =
            kept.iter().map(|&o| kept.iter().map(|&d| self.rows[o][d]).collect()).collect();
        normalize_rows(&mut rows);

        debug!(kept = domains.len(), "restricted transition matrix");
        Self { domains, index, rows }
    }
}
