//! Reading browsing logs into typed, time-ordered [`Event`]s, and rendering them as action tokens.
mod event;
mod loader;
mod record;
pub mod tokenize;

pub use event::{
    ChangeType,
    Event,
};
pub use loader::{
    LoadedLog,
    LogLoader,
};
pub use record::{
    parse_row,
    parse_timestamp,
    LogRecord,
    ACCESS_TYPE,
};

#[cfg(test)]
mod tests;
