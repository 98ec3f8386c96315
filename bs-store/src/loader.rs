use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
};
use std::path::Path;

use anyhow::Context;
use bs_core::errors::ParseError;
use tracing::{
    info,
    instrument,
    warn,
};

use crate::event::Event;
use crate::record::{
    parse_row,
    LogRecord,
};

/// Reads a headerless `timestamp,info,type` log.
///
/// Malformed rows are skipped and reported individually; only I/O failures abort the load.
pub struct LogLoader;

impl LogLoader {
    #[instrument(skip(reader))]
    pub fn load<R: BufRead>(reader: R) -> anyhow::Result<LoadedLog> {
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("reading log line {}", i + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(i + 1, &line) {
                Ok(rec) => records.push(rec),
                Err(err) => {
                    warn!(%err, "skipping malformed log row");
                    skipped.push(err);
                },
            }
        }

        // stable, so rows sharing a timestamp keep file order
        records.sort_by_key(|r| r.timestamp);
        info!(rows = records.len(), skipped = skipped.len(), "loaded browsing log");

        Ok(LoadedLog { records, skipped })
    }

    pub fn load_path(path: &Path) -> anyhow::Result<LoadedLog> {
        let file = File::open(path).with_context(|| format!("opening log {}", path.display()))?;
        Self::load(BufReader::new(file))
    }
}

/// The rows of a log, sorted by timestamp, plus the errors for every row that was dropped.
#[derive(Debug, Default)]
pub struct LoadedLog {
    records: Vec<LogRecord>,
    skipped: Vec<ParseError>,
}

impl LoadedLog {
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[ParseError] {
        &self.skipped
    }

    /// Page-access events with derived domain, change type and time delta.
    pub fn access_events(&self) -> Vec<Event> {
        Event::derive(self.records.iter().filter(|r| r.is_access()))
    }
}
