//! CSV sample import and export.
//!
//! # CSV format
//!
//! One row per sample.  `quality` may be omitted (defaults to `good`).
//!
//! ```csv
//! timestamp,kind,value,quality
//! 0,float,21.5,good
//! 900000,float,22.0,good
//! 1800000,boolean,true,bad
//! ```
//!
//! **`kind`** field:
//!
//! | Value     | `value` parsed as       |
//! |-----------|-------------------------|
//! | `float`   | `f64`                   |
//! | `integer` | `i64`                   |
//! | `boolean` | `true` / `false`        |
//! | `text`    | kept verbatim           |
//!
//! Rows need not be sorted; stores order samples by timestamp on insert.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Deserialize;

use sr_core::{Quality, SampledValue, Timestamp, Value};

use crate::{StoreError, StoreResult};

const HEADER: [&str; 4] = ["timestamp", "kind", "value", "quality"];

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SampleRecord {
    timestamp: i64,
    kind:      String,
    value:     String,
    #[serde(default)]
    quality:   Option<String>,
}

// ── Import ────────────────────────────────────────────────────────────────────

/// Load samples from a CSV file.
pub fn read_samples_csv(path: &Path) -> StoreResult<Vec<SampledValue>> {
    let file = File::open(path).map_err(StoreError::Io)?;
    read_samples(file)
}

/// Like [`read_samples_csv`] but accepts any `Read` source.
pub fn read_samples<R: Read>(reader: R) -> StoreResult<Vec<SampledValue>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut samples = Vec::new();

    for (line, result) in csv_reader.deserialize::<SampleRecord>().enumerate() {
        let row = result.map_err(|e| StoreError::Parse(e.to_string()))?;
        // +2: one for the header, one for 1-based numbering.
        let at = line + 2;
        samples.push(SampledValue {
            timestamp: Timestamp(row.timestamp),
            value:     parse_value(&row.kind, &row.value, at)?,
            quality:   parse_quality(row.quality.as_deref(), at)?,
        });
    }

    Ok(samples)
}

// ── Export ────────────────────────────────────────────────────────────────────

/// Write samples to a CSV file, replacing it if it exists.  Returns the
/// number of rows written.
pub fn write_samples_csv<I>(path: &Path, samples: I) -> StoreResult<usize>
where
    I: IntoIterator<Item = SampledValue>,
{
    let file = File::create(path)?;
    write_samples(file, samples)
}

/// Like [`write_samples_csv`] but accepts any `Write` sink.
pub fn write_samples<W, I>(writer: W, samples: I) -> StoreResult<usize>
where
    W: Write,
    I: IntoIterator<Item = SampledValue>,
{
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;

    let mut written = 0;
    for s in samples {
        out.write_record(&[
            s.timestamp.0.to_string(),
            s.value.kind().to_owned(),
            s.value.to_string(),
            s.quality.as_str().to_owned(),
        ])?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_value(kind: &str, raw: &str, line: usize) -> StoreResult<Value> {
    let bad = |what: &str| StoreError::Parse(format!("line {line}: invalid {what} value {raw:?}"));
    match kind.trim() {
        "float" => raw.trim().parse().map(Value::Float).map_err(|_| bad("float")),
        "integer" => raw.trim().parse().map(Value::Integer).map_err(|_| bad("integer")),
        "boolean" => raw.trim().parse().map(Value::Boolean).map_err(|_| bad("boolean")),
        "text" => Ok(Value::Text(raw.to_owned())),
        other => Err(StoreError::Parse(format!(
            "line {line}: unknown kind {other:?}: expected \"float\", \"integer\", \"boolean\" or \"text\""
        ))),
    }
}

fn parse_quality(raw: Option<&str>, line: usize) -> StoreResult<Quality> {
    match raw.map(str::trim) {
        None | Some("") | Some("good") => Ok(Quality::Good),
        Some("bad") => Ok(Quality::Bad),
        Some(other) => Err(StoreError::Parse(format!(
            "line {line}: invalid quality {other:?}: expected \"good\" or \"bad\""
        ))),
    }
}
