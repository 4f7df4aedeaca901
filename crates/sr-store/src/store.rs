//! The `TimeSeriesStore` trait implemented by all backends, and the
//! `StoreFactory` used to allocate one store per schedule.

use sr_core::{InterpolationMode, SampledValue, TimeRange, Timestamp, interpolate};

use crate::{MemoryStore, StoreError, StoreResult};

/// Ordered sample storage for one schedule.
///
/// # Contract
///
/// - **Not internally synchronized for writers.**  Mutating methods take
///   `&mut self`; callers serialize them (the schedule layer does so through
///   its transaction manager).
/// - **Atomic per call.**  A mutating method either applies completely or
///   returns an error having changed nothing.  Arguments are validated before
///   any sample is touched.
/// - **`Timestamp::MAX` is not storable.**  It is the open end of every
///   unbounded range, so a sample there could never be counted, iterated or
///   deleted; inserts reject it with [`StoreError::InvalidArgument`].
/// - **Overwrite on equal timestamps.**  Inserting a sample whose timestamp
///   already exists replaces the stored one; within one batch the later
///   sample wins.
/// - After [`destroy`][Self::destroy] every method returns
///   [`StoreError::Destroyed`].
pub trait TimeSeriesStore: Send + Sync {
    // ── Mutation ──────────────────────────────────────────────────────────

    /// Insert `samples`.  When `calculated_at` is `Some`, it becomes the
    /// store's last calculation time.
    fn insert(
        &mut self,
        samples: &[SampledValue],
        calculated_at: Option<Timestamp>,
    ) -> StoreResult<()>;

    /// Remove every sample in `range`; returns how many were removed.
    fn delete(&mut self, range: TimeRange) -> StoreResult<usize>;

    /// Remove every sample in `range`, then insert `samples`, as one atomic
    /// step.  Every sample must lie inside `range`.
    fn replace(
        &mut self,
        range: TimeRange,
        samples: &[SampledValue],
        calculated_at: Option<Timestamp>,
    ) -> StoreResult<()>;

    fn set_interpolation_mode(&mut self, mode: InterpolationMode) -> StoreResult<()>;

    /// Record the last committed modification time; `None` marks it unset.
    fn set_last_modified(&mut self, at: Option<Timestamp>) -> StoreResult<()>;

    /// Drop all samples and metadata and refuse further use.
    fn destroy(&mut self) -> StoreResult<()>;

    // ── Queries ───────────────────────────────────────────────────────────

    /// Last sample with `timestamp <= t`.
    fn previous_sample(&self, t: Timestamp) -> StoreResult<Option<SampledValue>>;

    /// First sample with `timestamp >= t`.
    fn next_sample(&self, t: Timestamp) -> StoreResult<Option<SampledValue>>;

    /// All samples in `range`, ascending by timestamp.
    fn samples(&self, range: TimeRange) -> StoreResult<Vec<SampledValue>>;

    fn count(&self, range: TimeRange) -> StoreResult<usize>;

    fn interpolation_mode(&self) -> StoreResult<InterpolationMode>;

    fn last_modified(&self) -> StoreResult<Option<Timestamp>>;

    fn last_calculation_time(&self) -> StoreResult<Option<Timestamp>>;

    // ── Provided ──────────────────────────────────────────────────────────

    /// Value at `t` under the store's interpolation mode.
    fn value_at(&self, t: Timestamp) -> StoreResult<Option<SampledValue>> {
        let mode = self.interpolation_mode()?;
        let previous = self.previous_sample(t)?;
        let next = self.next_sample(t)?;
        Ok(interpolate(mode, t, previous.as_ref(), next.as_ref()))
    }

    fn is_empty(&self, range: TimeRange) -> StoreResult<bool> {
        Ok(self.count(range)? == 0)
    }
}

/// Reject a batch holding a sample at `Timestamp::MAX`.
pub fn check_storable(samples: &[SampledValue]) -> StoreResult<()> {
    match samples.iter().find(|s| s.timestamp == Timestamp::MAX) {
        Some(s) => Err(StoreError::InvalidArgument(format!(
            "sample at {} lies past the end of the time axis",
            s.timestamp
        ))),
        None => Ok(()),
    }
}

/// Reject any sample that falls outside `range`.
pub(crate) fn check_within(range: TimeRange, samples: &[SampledValue]) -> StoreResult<()> {
    match samples.iter().find(|s| !range.contains(s.timestamp)) {
        Some(s) => Err(StoreError::InvalidArgument(format!(
            "sample at {} lies outside replace range {range}",
            s.timestamp
        ))),
        None => Ok(()),
    }
}

// ── StoreFactory ──────────────────────────────────────────────────────────────

/// Allocates a fresh, empty store for a newly created schedule.
///
/// `series` is a stable name for the store (the schedule's path); backends
/// that persist data use it as their key.
pub trait StoreFactory: Send + Sync {
    fn create_store(&self, series: &str) -> StoreResult<Box<dyn TimeSeriesStore>>;
}

/// Factory for [`MemoryStore`]s.
#[derive(Copy, Clone, Debug, Default)]
pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn create_store(&self, _series: &str) -> StoreResult<Box<dyn TimeSeriesStore>> {
        Ok(Box::new(MemoryStore::new()))
    }
}
