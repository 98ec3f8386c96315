use bs_core::domain::Domain;
use chrono::{
    DateTime,
    Utc,
};
use serde::Serialize;
use tracing::warn;

use crate::record::LogRecord;

/// Whether an access moved to a new site or stayed on the current one.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    DomainChange,
    RouteChange,
}

/// A page access with its derived domain, change type and time since the previous access.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub payload: String,
    pub record_type: String,
    pub domain: Domain,
    pub change_type: ChangeType,
    pub time_delta: f64,
}

impl Event {
    /// Derive events from timestamp-ordered access records.
    ///
    /// Records whose payload isn't an `http(s)` URL are dropped.  The first surviving record is a
    /// domain change with a zero delta; every later one is a domain change iff its domain differs
    /// from the previous surviving record's.
    pub fn derive<'a>(records: impl IntoIterator<Item = &'a LogRecord>) -> Vec<Event> {
        records
            .into_iter()
            .filter_map(|rec| match Domain::from_url(&rec.info) {
                Some(domain) => Some((rec, domain)),
                None => {
                    warn!(info = %rec.info, ts = %rec.timestamp, "skipping access with unparsable url");
                    None
                },
            })
            .fold(Vec::new(), |mut events: Vec<Event>, (rec, domain)| {
                let (change_type, time_delta) = match events.last() {
                    None => (ChangeType::DomainChange, 0.0),
                    Some(prev) if prev.domain == domain => {
                        (ChangeType::RouteChange, seconds_between(prev.timestamp, rec.timestamp))
                    },
                    Some(prev) => (ChangeType::DomainChange, seconds_between(prev.timestamp, rec.timestamp)),
                };
                events.push(Event {
                    timestamp: rec.timestamp,
                    payload: rec.info.clone(),
                    record_type: rec.record_type.clone(),
                    domain,
                    change_type,
                    time_delta,
                });
                events
            })
    }

    pub fn is_domain_change(&self) -> bool {
        self.change_type == ChangeType::DomainChange
    }

    /// Seconds from this event to `later`, never negative.
    pub fn seconds_until(&self, later: &Event) -> f64 {
        seconds_between(self.timestamp, later.timestamp)
    }

    /// The domain-change sub-sequence, in order.
    pub fn domain_changes(events: &[Event]) -> impl Iterator<Item = &Event> {
        events.iter().filter(|e| e.is_domain_change())
    }
}

/// Non-negative seconds from `from` to `to`, with microsecond resolution.
pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let secs = (to - from).num_microseconds().map_or(0.0, |us| us as f64 / 1e6);
    secs.max(0.0)
}
