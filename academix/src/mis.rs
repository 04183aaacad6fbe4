//! MIS identifiers: the nine-digit student number used as an alternative
//! login key. Layout is `61` + admission year (two digits) + branch code
//! (`01`..`06`) + roll number (three digits).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PortalError, Result};

static MIS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^61\d{2}0[1-6]\d{3}$").expect("MIS pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mis(String);

impl Mis {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if MIS_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(PortalError::bad_request("Please provide a valid MIS number"))
        }
    }

    /// Quick check for login keys, which may be an email instead
    pub fn looks_like(raw: &str) -> bool {
        MIS_PATTERN.is_match(raw.trim())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Mis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
