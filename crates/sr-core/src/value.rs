//! Sample values: `Value`, `Quality`, and `SampledValue`.

use std::fmt;

use crate::Timestamp;

// ── Value ─────────────────────────────────────────────────────────────────────

/// The payload of one sample.
///
/// A schedule does not enforce a single value type; mixing types is allowed
/// but only numeric values take part in linear interpolation.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Numeric view used by interpolation.  `None` for text values.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v),
            Value::Integer(v) => Some(v as f64),
            Value::Boolean(b) => Some(if b { 1.0 } else { 0.0 }),
            Value::Text(_) => None,
        }
    }

    /// Short type tag, also used as the `kind` column in CSV and SQLite.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Float(_) => "float",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

// ── Quality ───────────────────────────────────────────────────────────────────

/// Whether a sample can be trusted.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quality {
    #[default]
    Good,
    Bad,
}

impl Quality {
    /// `Bad` if either input is `Bad`.
    #[inline]
    pub fn worst(self, other: Quality) -> Quality {
        if self == Quality::Bad || other == Quality::Bad {
            Quality::Bad
        } else {
            Quality::Good
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Good => "good",
            Quality::Bad => "bad",
        }
    }
}

// ── SampledValue ──────────────────────────────────────────────────────────────

/// One `(timestamp, value)` point of a time series.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampledValue {
    pub timestamp: Timestamp,
    pub value:     Value,
    pub quality:   Quality,
}

impl SampledValue {
    /// A sample with `Quality::Good`.
    pub fn new(timestamp: Timestamp, value: impl Into<Value>) -> Self {
        Self { timestamp, value: value.into(), quality: Quality::Good }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}
