//! Rendering a log as a flat stream of printable action tokens.
//!
//! Every row becomes two tokens: `t<P>`, where `P` is the time since the previous row rounded to
//! the nearest power of two, then `<type> : <payload>`.  Access payloads are reduced to their base
//! domain; all other payloads are passed through untouched.
use std::io::Write;

use bs_core::domain::Domain;
use bs_core::quantize::nearest_power_of_two;

use crate::event::seconds_between;
use crate::record::LogRecord;

/// Tokens for `records`, which must already be in timestamp order.
pub fn action_tokens(records: &[LogRecord]) -> Vec<String> {
    let deltas = std::iter::once(0.0).chain(records.windows(2).map(|w| seconds_between(w[0].timestamp, w[1].timestamp)));

    records
        .iter()
        .zip(deltas)
        .flat_map(|(rec, delta)| [format!("t<{}>", nearest_power_of_two(delta)), action_token(rec)])
        .collect()
}

fn action_token(rec: &LogRecord) -> String {
    if rec.is_access() {
        if let Some(domain) = Domain::from_url(&rec.info) {
            return format!("{} : {domain}", rec.record_type);
        }
    }
    format!("{} : {}", rec.record_type, rec.info)
}

/// Write one token per line, returning how many were written.
pub fn write_tokens<W: Write>(records: &[LogRecord], mut out: W) -> std::io::Result<usize> {
    let tokens = action_tokens(records);
    for token in &tokens {
        writeln!(out, "{token}")?;
    }
    out.flush()?;
    Ok(tokens.len())
}
