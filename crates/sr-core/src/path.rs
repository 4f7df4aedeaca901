//! `ResourcePath` — the stable tree address of a resource.
//!
//! Paths are `/`-separated sequences of non-empty segments made of ASCII
//! letters, digits and `_`.  A leading or trailing `/` is tolerated on input
//! and dropped, so `"/home/pv/forecast"` and `"home/pv/forecast"` name the
//! same resource.

use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// A validated, normalized resource path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(invalid(raw, "path is empty"));
        }
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(invalid(raw, "empty path segment"));
            }
            if !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(raw, "segments may only contain [A-Za-z0-9_]"));
            }
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Path of the parent node, or `None` for a top-level resource.
    pub fn parent(&self) -> Option<ResourcePath> {
        self.0.rsplit_once('/').map(|(p, _)| ResourcePath(p.to_owned()))
    }

    /// Append one segment.
    pub fn child(&self, segment: &str) -> CoreResult<ResourcePath> {
        ResourcePath::parse(&format!("{}/{}", self.0, segment))
    }

    /// `true` if `self` equals `prefix` or lies below it.
    pub fn starts_with(&self, prefix: &ResourcePath) -> bool {
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0) && self.0.as_bytes().get(prefix.0.len()) == Some(&b'/'))
    }
}

fn invalid(raw: &str, reason: &'static str) -> CoreError {
    CoreError::InvalidPath { path: raw.to_owned(), reason }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourcePath {
    type Err = CoreError;
    fn from_str(s: &str) -> CoreResult<Self> {
        ResourcePath::parse(s)
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = CoreError;
    fn try_from(s: String) -> CoreResult<Self> {
        ResourcePath::parse(&s)
    }
}

impl TryFrom<&str> for ResourcePath {
    type Error = CoreError;
    fn try_from(s: &str) -> CoreResult<Self> {
        ResourcePath::parse(s)
    }
}

impl From<ResourcePath> for String {
    fn from(p: ResourcePath) -> String {
        p.0
    }
}
