//! Interpolation modes and the point-query rule each one implies.
//!
//! Given the neighbours of a query time `t` — the last sample at or before
//! `t` and the first sample at or after `t` — [`interpolate`] answers "what is
//! the value at `t`?":
//!
//! | Mode      | Answer                                                     |
//! |-----------|------------------------------------------------------------|
//! | `None`    | only an exact sample at `t`                                |
//! | `Steps`   | the previous sample's value, held until the next sample    |
//! | `Linear`  | straight line between numeric neighbours, no extrapolation |
//! | `Nearest` | the closer neighbour; ties go to the earlier sample        |
//!
//! The returned sample always carries timestamp `t`.

use std::fmt;
use std::str::FromStr;

use crate::{Quality, SampledValue, Timestamp, Value};

/// How a schedule answers queries between stored samples.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationMode {
    #[default]
    None,
    Steps,
    Linear,
    Nearest,
}

impl InterpolationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InterpolationMode::None => "none",
            InterpolationMode::Steps => "steps",
            InterpolationMode::Linear => "linear",
            InterpolationMode::Nearest => "nearest",
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(InterpolationMode::None),
            "steps" => Ok(InterpolationMode::Steps),
            "linear" => Ok(InterpolationMode::Linear),
            "nearest" => Ok(InterpolationMode::Nearest),
            other => Err(format!("unknown interpolation mode {other:?}")),
        }
    }
}

/// Value at `t` under `mode`, from the neighbouring samples.
///
/// `previous` must satisfy `previous.timestamp <= t` and `next` must satisfy
/// `next.timestamp >= t`.
pub fn interpolate(
    mode: InterpolationMode,
    t: Timestamp,
    previous: Option<&SampledValue>,
    next: Option<&SampledValue>,
) -> Option<SampledValue> {
    if let Some(p) = previous.filter(|p| p.timestamp == t) {
        return Some(p.clone());
    }
    if let Some(n) = next.filter(|n| n.timestamp == t) {
        return Some(n.clone());
    }

    match mode {
        InterpolationMode::None => None,
        InterpolationMode::Steps => previous.map(|p| at(t, p.value.clone(), p.quality)),
        InterpolationMode::Linear => {
            let (p, n) = (previous?, next?);
            let (pv, nv) = (p.value.as_f64()?, n.value.as_f64()?);
            let frac = (t - p.timestamp) as f64 / (n.timestamp - p.timestamp) as f64;
            Some(at(t, Value::Float(pv + (nv - pv) * frac), p.quality.worst(n.quality)))
        }
        InterpolationMode::Nearest => {
            let chosen = match (previous, next) {
                (Some(p), Some(n)) => {
                    if t - p.timestamp <= n.timestamp - t { p } else { n }
                }
                (Some(p), None) => p,
                (None, Some(n)) => n,
                (None, None) => return None,
            };
            Some(at(t, chosen.value.clone(), chosen.quality))
        }
    }
}

fn at(t: Timestamp, value: Value, quality: Quality) -> SampledValue {
    SampledValue { timestamp: t, value, quality }
}
