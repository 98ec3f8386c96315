//! Base-domain identifiers.
//!
//! A [`Domain`] is the `scheme://host[:port]` prefix of an `http` or `https` URL, lowercased. Path,
//! query and fragment are stripped, so every page on a site maps to the same identifier.
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::ParseError;

lazy_static! {
    static ref BASE_URL_RE: Regex = Regex::new(r"(?i)^(https?://[^/?#\s]+)").unwrap();
}

/// A lowercased `scheme://host[:port]`, e.g. `https://example.com`.  Ordered by its string form.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Extract the base domain from a URL, or `None` if it isn't an `http(s)://host...` URL.
    pub fn from_url(url: &str) -> Option<Domain> {
        BASE_URL_RE
            .captures(url.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| Domain(m.as_str().to_lowercase()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Domain {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::from_url(s).ok_or_else(|| ParseError::InvalidUrl(s.into()))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
