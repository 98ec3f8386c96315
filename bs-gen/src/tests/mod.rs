mod fitter_test;
mod weibull_test;

use bs_core::domain::Domain;
use bs_store::{
    Event,
    LogRecord,
};
use chrono::{
    Duration,
    TimeZone,
    Utc,
};

use crate::{
    BrowsingModel,
    DwellModel,
    DwellModels,
    TransitionMatrixBuilder,
    WeibullParams,
};

pub(crate) fn dom(name: &str) -> Domain {
    format!("https://{name}.com").parse().unwrap()
}

/// Derived access events for `(seconds since start, url)` pairs.
pub(crate) fn events(accesses: &[(f64, &str)]) -> Vec<Event> {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let records: Vec<LogRecord> = accesses
        .iter()
        .map(|&(secs, url)| LogRecord {
            timestamp: t0 + Duration::milliseconds((secs * 1000.0) as i64),
            info: url.into(),
            record_type: "access".into(),
        })
        .collect();
    Event::derive(&records)
}

/// A model whose transitions come from walking `sequence`, with the same dwell parameters for
/// every domain.
pub(crate) fn model(sequence: &[&str], domain: WeibullParams, route: WeibullParams) -> BrowsingModel {
    let domains: Vec<Domain> = sequence.iter().map(|s| dom(s)).collect();
    let mut builder = TransitionMatrixBuilder::new();
    builder.observe_all(&domains);
    let matrix = builder.build();

    let dwell = DwellModels::from_models(matrix.domains().iter().map(|d| (d.clone(), DwellModel { domain, route })));
    BrowsingModel::new(&matrix, dwell)
}
