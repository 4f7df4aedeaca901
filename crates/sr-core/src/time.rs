//! Time model: timestamps, half-open ranges, and clocks.
//!
//! # Design
//!
//! Time is an integer count of milliseconds since the Unix epoch, wrapped in
//! [`Timestamp`].  Integer time keeps range arithmetic exact and makes
//! "unbounded" expressible as `Timestamp::MIN` / `Timestamp::MAX`.
//!
//! Ranges are half-open, `[start, end)`, everywhere in the framework:
//!
//! ```text
//! TimeRange::all()         = [MIN, MAX)
//! TimeRange::since(t)      = [t,   MAX)
//! TimeRange::until(t)      = [MIN, t)
//! TimeRange::new(a, b)     = [a,   b)      (a <= b, else CoreError)
//! ```
//!
//! The process clock is a collaborator, not a global: schedule resources read
//! it through the [`Clock`] trait so tests can drive time with
//! [`ManualClock`].

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{CoreError, CoreResult};

// ── Timestamp ─────────────────────────────────────────────────────────────────

/// Milliseconds since the Unix epoch.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);
    pub const MIN: Timestamp = Timestamp(i64::MIN);
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    #[inline]
    pub fn millis(self) -> i64 {
        self.0
    }

    /// `self + ms`, saturating at the representable bounds.
    #[inline]
    pub fn offset(self, ms: i64) -> Timestamp {
        Timestamp(self.0.saturating_add(ms))
    }

    /// The smallest timestamp strictly after `self`.
    #[inline]
    pub fn successor(self) -> Timestamp {
        self.offset(1)
    }
}

impl std::ops::Add<i64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: i64) -> Timestamp {
        self.offset(rhs)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: Timestamp) -> i64 {
        self.0.saturating_sub(rhs.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Timestamp::MIN => f.write_str("-inf"),
            Timestamp::MAX => f.write_str("+inf"),
            Timestamp(ms) => write!(f, "{ms}ms"),
        }
    }
}

// ── TimeRange ─────────────────────────────────────────────────────────────────

/// A half-open interval `[start, end)` of timestamps.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeRange {
    pub start: Timestamp,
    pub end:   Timestamp,
}

impl TimeRange {
    /// `[start, end)`.  Fails if `start > end`; `start == end` is a valid
    /// empty range.
    pub fn new(start: Timestamp, end: Timestamp) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Every representable timestamp.
    pub const fn all() -> Self {
        Self { start: Timestamp::MIN, end: Timestamp::MAX }
    }

    /// `[start, +inf)`.
    pub const fn since(start: Timestamp) -> Self {
        Self { start, end: Timestamp::MAX }
    }

    /// `[-inf, end)`.
    pub const fn until(end: Timestamp) -> Self {
        Self { start: Timestamp::MIN, end }
    }

    /// `[start, start + step * count)` — the span covered by `count` samples
    /// spaced `step` apart.  Saturates instead of overflowing.
    pub fn fixed_step(start: Timestamp, step: i64, count: usize) -> CoreResult<Self> {
        if step <= 0 {
            return Err(CoreError::InvalidStep(step));
        }
        let span = step.saturating_mul(count as i64);
        Self::new(start, start.offset(span))
    }

    #[inline]
    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t < self.end
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Source of the current framework time.
///
/// Implementations must be cheap to call and safe to share across threads.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from [`SystemTime`].
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // A system clock set before 1970 reports negative time rather than failing.
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Timestamp(d.as_millis() as i64),
            Err(e) => Timestamp(-(e.duration().as_millis() as i64)),
        }
    }
}

/// A clock that only moves when told to.
///
/// Used by tests and simulations to make `lastUpdateTime` deterministic.
/// Interior atomics let it be shared behind an `Arc` and advanced while
/// other threads read it.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: AtomicI64::new(start.0) }
    }

    /// Move the clock forward by `ms` and return the new time.
    pub fn advance(&self, ms: i64) -> Timestamp {
        Timestamp(self.now.fetch_add(ms, Ordering::SeqCst) + ms)
    }

    /// Jump to an arbitrary time (may move backwards).
    pub fn set(&self, t: Timestamp) {
        self.now.store(t.0, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}
