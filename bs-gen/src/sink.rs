//! Destinations for simulation output.
//!
//! The simulator only produces [`SimulationRecord`]s; how they are rendered (if at all) is up to
//! the sink.
use std::io::Write;

use bs_core::domain::Domain;
use serde::{
    Deserialize,
    Serialize,
};

/// Whether a record describes a whole visit or a route change inside one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A visit to a domain; `duration` is the visit length.
    Domain,
    /// A route change; `duration` is the interval since the previous change in the visit.
    Route,
}

/// One emitted simulation event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// Domain being visited.
    pub domain: Domain,
    /// Visit or route change.
    pub kind: RecordKind,
    /// Duration in seconds.
    pub duration: f64,
}

impl SimulationRecord {
    /// A visit record.
    pub fn domain(domain: &Domain, duration: f64) -> Self {
        Self { domain: domain.clone(), kind: RecordKind::Domain, duration }
    }

    /// A route-change record.
    pub fn route(domain: &Domain, duration: f64) -> Self {
        Self { domain: domain.clone(), kind: RecordKind::Route, duration }
    }
}

/// Receives records as the simulator produces them.
pub trait SimulationSink {
    /// Accept one record.
    fn record(&mut self, record: &SimulationRecord) -> std::io::Result<()>;

    /// Called once a run is over, successful or not.
    fn finish(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<S: SimulationSink + ?Sized> SimulationSink for Box<S> {
    fn record(&mut self, record: &SimulationRecord) -> std::io::Result<()> {
        (**self).record(record)
    }

    fn finish(&mut self) -> std::io::Result<()> {
        (**self).finish()
    }
}

/// Renders `website: <domain> duration: <secs>` / `website: <domain> route_duration: <secs>`.
pub struct TextSink<W> {
    /// Output stream.
    out: W,
}

impl<W: Write> TextSink<W> {
    /// Write lines to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SimulationSink for TextSink<W> {
    fn record(&mut self, record: &SimulationRecord) -> std::io::Result<()> {
        let label = match record.kind {
            RecordKind::Domain => "duration",
            RecordKind::Route => "route_duration",
        };
        writeln!(self.out, "website: {} {label}: {}", record.domain, record.duration)
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

/// Writes each record as one JSON object per line.
pub struct JsonLinesSink<W> {
    /// Output stream.
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Write JSON lines to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SimulationSink for JsonLinesSink<W> {
    fn record(&mut self, record: &SimulationRecord) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

/// Keeps every record in memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VecSink {
    /// Records in emission order.
    pub records: Vec<SimulationRecord>,
}

impl SimulationSink for VecSink {
    fn record(&mut self, record: &SimulationRecord) -> std::io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
