//! SQLite backend (feature `sqlite`).
//!
//! Many stores share one database file; each store owns its own connection
//! and addresses its rows by a `series` key (the schedule's path).  Two tables:
//!
//! ```text
//! samples(series, ts, kind, value, quality)   PRIMARY KEY (series, ts)
//! series(series, interpolation, last_modified, last_calculation)
//! ```
//!
//! `value` is stored with SQLite's dynamic typing (REAL / INTEGER / TEXT);
//! `kind` disambiguates booleans from integers.  Every mutating call runs in
//! its own SQLite transaction, which is what makes a call atomic on disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use sr_core::{InterpolationMode, Quality, SampledValue, TimeRange, Timestamp, Value};

use crate::store::{check_storable, check_within};
use crate::{StoreError, StoreFactory, StoreResult, TimeSeriesStore};

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous  = NORMAL;
    CREATE TABLE IF NOT EXISTS samples (
        series  TEXT    NOT NULL,
        ts      INTEGER NOT NULL,
        kind    TEXT    NOT NULL,
        value,
        quality INTEGER NOT NULL,
        PRIMARY KEY (series, ts)
    ) WITHOUT ROWID;
    CREATE TABLE IF NOT EXISTS series (
        series           TEXT PRIMARY KEY,
        interpolation    TEXT NOT NULL DEFAULT 'none',
        last_modified    INTEGER,
        last_calculation INTEGER
    );";

const SELECT_SAMPLE: &str = "SELECT ts, kind, value, quality FROM samples";

/// A time-series store persisted in an SQLite database.
pub struct SqliteStore {
    conn:      Mutex<Connection>,
    series:    String,
    destroyed: bool,
}

impl SqliteStore {
    /// Attach to `series` in the database at `db_path`, keeping any samples
    /// already stored under that key.
    pub fn open(db_path: &Path, series: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::init(conn, series, false)
    }

    /// Like [`open`][Self::open] but discards any previous rows for `series`,
    /// yielding an empty store.
    pub fn create(db_path: &Path, series: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::init(conn, series, true)
    }

    /// An empty store in a private in-memory database.
    pub fn open_in_memory(series: &str) -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?, series, true)
    }

    fn init(mut conn: Connection, series: &str, reset: bool) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        if reset {
            tx.execute("DELETE FROM samples WHERE series = ?1", params![series])?;
            tx.execute("DELETE FROM series WHERE series = ?1", params![series])?;
        }
        tx.execute(
            "INSERT INTO series (series) VALUES (?1) ON CONFLICT(series) DO NOTHING",
            params![series],
        )?;
        tx.commit()?;

        tracing::debug!(series, reset, "sqlite store attached");
        Ok(Self { conn: Mutex::new(conn), series: series.to_owned(), destroyed: false })
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    fn live(&self) -> StoreResult<()> {
        if self.destroyed { Err(StoreError::Destroyed) } else { Ok(()) }
    }

    fn query_one(&self, sql: &str, t: Timestamp) -> StoreResult<Option<SampledValue>> {
        self.live()?;
        let conn = self.conn.lock();
        let sample = conn
            .query_row(sql, params![self.series, t.0], row_to_sample)
            .optional()?;
        Ok(sample)
    }

    fn metadata<T>(&self, column: &str, map: impl FnOnce(Option<i64>) -> T) -> StoreResult<T> {
        self.live()?;
        let conn = self.conn.lock();
        let raw: Option<i64> = conn.query_row(
            &format!("SELECT {column} FROM series WHERE series = ?1"),
            params![self.series],
            |r| r.get(0),
        )?;
        Ok(map(raw))
    }
}

// ── Row encoding ──────────────────────────────────────────────────────────────

fn encode(value: &Value) -> SqlValue {
    match value {
        Value::Float(v) => SqlValue::Real(*v),
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Boolean(v) => SqlValue::Integer(*v as i64),
        Value::Text(v) => SqlValue::Text(v.clone()),
    }
}

fn decode(kind: &str, raw: SqlValue) -> Option<Value> {
    match (kind, raw) {
        ("float", SqlValue::Real(v)) => Some(Value::Float(v)),
        ("float", SqlValue::Integer(v)) => Some(Value::Float(v as f64)),
        ("integer", SqlValue::Integer(v)) => Some(Value::Integer(v)),
        ("boolean", SqlValue::Integer(v)) => Some(Value::Boolean(v != 0)),
        ("text", SqlValue::Text(v)) => Some(Value::Text(v)),
        _ => None,
    }
}

fn row_to_sample(row: &Row<'_>) -> rusqlite::Result<SampledValue> {
    let ts: i64 = row.get(0)?;
    let kind: String = row.get(1)?;
    let raw: SqlValue = row.get(2)?;
    let quality: i64 = row.get(3)?;
    let data_type = raw.data_type();
    let value = decode(&kind, raw)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(2, "value".to_owned(), data_type))?;
    let quality = if quality == 0 { Quality::Good } else { Quality::Bad };
    Ok(SampledValue { timestamp: Timestamp(ts), value, quality })
}

fn insert_rows(
    tx: &Transaction<'_>,
    series: &str,
    samples: &[SampledValue],
    calculated_at: Option<Timestamp>,
) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR REPLACE INTO samples (series, ts, kind, value, quality) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for s in samples {
        stmt.execute(params![
            series,
            s.timestamp.0,
            s.value.kind(),
            encode(&s.value),
            (s.quality == Quality::Bad) as i64,
        ])?;
    }
    if let Some(calc) = calculated_at {
        tx.execute(
            "UPDATE series SET last_calculation = ?2 WHERE series = ?1",
            params![series, calc.0],
        )?;
    }
    Ok(())
}

fn delete_rows(tx: &Transaction<'_>, series: &str, range: TimeRange) -> rusqlite::Result<usize> {
    tx.execute(
        "DELETE FROM samples WHERE series = ?1 AND ts >= ?2 AND ts < ?3",
        params![series, range.start.0, range.end.0],
    )
}

// ── TimeSeriesStore ───────────────────────────────────────────────────────────

impl TimeSeriesStore for SqliteStore {
    fn insert(
        &mut self,
        samples: &[SampledValue],
        calculated_at: Option<Timestamp>,
    ) -> StoreResult<()> {
        self.live()?;
        check_storable(samples)?;
        let conn = self.conn.get_mut();
        let tx = conn.transaction()?;
        insert_rows(&tx, &self.series, samples, calculated_at)?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&mut self, range: TimeRange) -> StoreResult<usize> {
        self.live()?;
        let conn = self.conn.get_mut();
        let tx = conn.transaction()?;
        let removed = delete_rows(&tx, &self.series, range)?;
        tx.commit()?;
        Ok(removed)
    }

    fn replace(
        &mut self,
        range: TimeRange,
        samples: &[SampledValue],
        calculated_at: Option<Timestamp>,
    ) -> StoreResult<()> {
        self.live()?;
        check_within(range, samples)?;
        let conn = self.conn.get_mut();
        let tx = conn.transaction()?;
        delete_rows(&tx, &self.series, range)?;
        insert_rows(&tx, &self.series, samples, calculated_at)?;
        tx.commit()?;
        Ok(())
    }

    fn set_interpolation_mode(&mut self, mode: InterpolationMode) -> StoreResult<()> {
        self.live()?;
        self.conn.get_mut().execute(
            "UPDATE series SET interpolation = ?2 WHERE series = ?1",
            params![self.series, mode.as_str()],
        )?;
        Ok(())
    }

    fn set_last_modified(&mut self, at: Option<Timestamp>) -> StoreResult<()> {
        self.live()?;
        self.conn.get_mut().execute(
            "UPDATE series SET last_modified = ?2 WHERE series = ?1",
            params![self.series, at.map(|t| t.0)],
        )?;
        Ok(())
    }

    fn destroy(&mut self) -> StoreResult<()> {
        self.live()?;
        let conn = self.conn.get_mut();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM samples WHERE series = ?1", params![self.series])?;
        tx.execute("DELETE FROM series WHERE series = ?1", params![self.series])?;
        tx.commit()?;
        self.destroyed = true;
        tracing::debug!(series = %self.series, "sqlite store destroyed");
        Ok(())
    }

    fn previous_sample(&self, t: Timestamp) -> StoreResult<Option<SampledValue>> {
        self.query_one(
            &format!("{SELECT_SAMPLE} WHERE series = ?1 AND ts <= ?2 ORDER BY ts DESC LIMIT 1"),
            t,
        )
    }

    fn next_sample(&self, t: Timestamp) -> StoreResult<Option<SampledValue>> {
        self.query_one(
            &format!("{SELECT_SAMPLE} WHERE series = ?1 AND ts >= ?2 ORDER BY ts ASC LIMIT 1"),
            t,
        )
    }

    fn samples(&self, range: TimeRange) -> StoreResult<Vec<SampledValue>> {
        self.live()?;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "{SELECT_SAMPLE} WHERE series = ?1 AND ts >= ?2 AND ts < ?3 ORDER BY ts ASC"
        ))?;
        let rows = stmt.query_map(params![self.series, range.start.0, range.end.0], row_to_sample)?;
        let samples = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    fn count(&self, range: TimeRange) -> StoreResult<usize> {
        self.live()?;
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM samples WHERE series = ?1 AND ts >= ?2 AND ts < ?3",
            params![self.series, range.start.0, range.end.0],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    fn interpolation_mode(&self) -> StoreResult<InterpolationMode> {
        self.live()?;
        let conn = self.conn.lock();
        let raw: String = conn.query_row(
            "SELECT interpolation FROM series WHERE series = ?1",
            params![self.series],
            |r| r.get(0),
        )?;
        raw.parse().map_err(StoreError::Parse)
    }

    fn last_modified(&self) -> StoreResult<Option<Timestamp>> {
        self.metadata("last_modified", |v| v.map(Timestamp))
    }

    fn last_calculation_time(&self) -> StoreResult<Option<Timestamp>> {
        self.metadata("last_calculation", |v| v.map(Timestamp))
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Allocates one [`SqliteStore`] per schedule inside a shared database file.
#[derive(Clone, Debug)]
pub struct SqliteStoreFactory {
    db_path: PathBuf,
}

impl SqliteStoreFactory {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl StoreFactory for SqliteStoreFactory {
    fn create_store(&self, series: &str) -> StoreResult<Box<dyn TimeSeriesStore>> {
        Ok(Box::new(SqliteStore::create(&self.db_path, series)?))
    }
}
