mod event_test;

use std::io::Cursor;

use crate::{
    LoadedLog,
    LogLoader,
};

pub(crate) fn load_str(log: &str) -> LoadedLog {
    LogLoader::load(Cursor::new(log.to_owned())).unwrap()
}
