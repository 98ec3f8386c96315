use bs_core::errors::ParseError;
use chrono::{
    DateTime,
    NaiveDate,
    NaiveDateTime,
    Utc,
};
use serde::Serialize;

/// Record type of page accesses; the only rows that carry a URL in `info`.
pub const ACCESS_TYPE: &str = "access";

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// One row of the raw log, before any derivation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub info: String,
    pub record_type: String,
}

impl LogRecord {
    pub fn is_access(&self) -> bool {
        self.record_type == ACCESS_TYPE
    }
}

/// Parse one headerless `timestamp,info,type` row.  `line` is only used for error reporting.
pub fn parse_row(line: usize, row: &str) -> Result<LogRecord, ParseError> {
    let fields = split_fields(row).ok_or(ParseError::UnterminatedQuote { line })?;
    let [ts, info, record_type]: [String; 3] =
        fields.try_into().map_err(|f: Vec<String>| ParseError::ColumnCount { line, found: f.len() })?;

    let timestamp =
        parse_timestamp(&ts).ok_or_else(|| ParseError::Timestamp { line, value: ts.trim().to_owned() })?;

    Ok(LogRecord {
        timestamp,
        info: info.trim().to_owned(),
        record_type: record_type.trim().to_owned(),
    })
}

/// Accepts RFC 3339 and the common naive `date time` layouts; naive values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

// Minimal CSV field splitter: commas separate fields, double quotes group, `""` is a literal quote.
// Returns `None` if a quoted field never closes.
pub(crate) fn split_fields(row: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = row.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            },
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}
