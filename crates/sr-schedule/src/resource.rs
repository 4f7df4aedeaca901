//! `ScheduleResource` — the handle through which a schedule is read and
//! written.
//!
//! # Guarded mutation
//!
//! Every value mutation runs the same steps, in this order:
//!
//! ```text
//! ① soft probe    exists && has_write_access        else Ok(false), no effects
//! ② strict check  check_write_permission            else Err(PermissionDenied)
//! ③ transaction   begin → one store call → finish   (finished on every path)
//! ④ stamp         store.last_modified = max(last_modified, clock.now())
//! ⑤ notify        ValueChanged for the owning schedule, then deliver
//! ⑥ Ok(true)
//! ```
//!
//! A failure inside ③ is returned as an error and skips ④ and ⑤.  Argument
//! errors are detected before ① and have no effects at all.  The stamp is
//! written to the store; if the schedule was deleted or relinked between ③
//! and ④ the change stays committed but ④ and ⑤ are skipped, so no event is
//! ever reported for a schedule that is gone.
//!
//! For an alias, ① and ② are applied to both the alias path and the path of
//! the schedule it points at; ④ and ⑤ apply to the owning schedule.
//!
//! Reads take no transaction, no structural lock and no access check.  A read
//! through a handle whose schedule no longer exists returns
//! [`ScheduleError::NotFound`].

use std::path::Path;
use std::sync::Arc;

use sr_core::{
    InterpolationMode, ResourcePath, SampledValue, TimeRange, Timestamp, Value,
};
use sr_store::{StoreError, StoreResult, TimeSeriesStore};
use sr_tree::ChangeEvent;

use crate::iter::SampleIter;
use crate::tree::Resolved;
use crate::{ScheduleError, ScheduleResult, ScheduleTree};

/// A schedule resource: a time series addressed by a path in the tree.
///
/// Cheap to clone.  The handle does not keep the schedule alive; it resolves
/// its node on each call.
#[derive(Clone)]
pub struct ScheduleResource {
    path: ResourcePath,
    tree: Arc<ScheduleTree>,
}

impl std::fmt::Debug for ScheduleResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleResource").field("path", &self.path).finish()
    }
}

/// Whether a guarded mutation needs a transaction around its store call.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Boundary {
    Transaction,
    Metadata,
}

impl ScheduleResource {
    pub(crate) fn new(path: ResourcePath, tree: Arc<ScheduleTree>) -> Self {
        Self { path, tree }
    }

    pub(crate) fn tree(&self) -> &Arc<ScheduleTree> {
        &self.tree
    }

    // ── Identity ──────────────────────────────────────────────────────────

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The node is in the tree and not being deleted.
    pub fn exists(&self) -> bool {
        self.tree.contains(&self.path)
    }

    pub fn is_reference(&self) -> ScheduleResult<bool> {
        self.tree.is_alias(&self.path)
    }

    /// Path of the schedule that owns the samples this handle sees: its own
    /// path, or the aliased schedule's.
    pub fn location(&self) -> ScheduleResult<ResourcePath> {
        Ok(self.tree.resolve(&self.path)?.location)
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    pub fn add_value(&self, t: Timestamp, value: impl Into<Value>) -> ScheduleResult<bool> {
        let sample = SampledValue::new(t, value);
        storable(std::slice::from_ref(&sample))?;
        self.guarded("add_value", Boundary::Transaction, |store| {
            store.insert(std::slice::from_ref(&sample), None).map(|()| 1)
        })
    }

    /// Insert a batch.  Samples at existing timestamps overwrite them.
    pub fn add_values(&self, samples: &[SampledValue]) -> ScheduleResult<bool> {
        storable(samples)?;
        self.guarded("add_values", Boundary::Transaction, |store| {
            store.insert(samples, None).map(|()| samples.len())
        })
    }

    pub fn add_value_calculated(
        &self,
        t:             Timestamp,
        value:         impl Into<Value>,
        calculated_at: Timestamp,
    ) -> ScheduleResult<bool> {
        let sample = SampledValue::new(t, value);
        storable(std::slice::from_ref(&sample))?;
        self.guarded("add_value_calculated", Boundary::Transaction, |store| {
            store.insert(std::slice::from_ref(&sample), Some(calculated_at)).map(|()| 1)
        })
    }

    pub fn add_values_calculated(
        &self,
        samples:       &[SampledValue],
        calculated_at: Timestamp,
    ) -> ScheduleResult<bool> {
        storable(samples)?;
        self.guarded("add_values_calculated", Boundary::Transaction, |store| {
            store.insert(samples, Some(calculated_at)).map(|()| samples.len())
        })
    }

    /// Replace `[start, start + step * values.len())` with one sample every
    /// `step` milliseconds, in one atomic store call.
    pub fn replace_values_fixed_step(
        &self,
        start:         Timestamp,
        values:        &[Value],
        step:          i64,
        calculated_at: Option<Timestamp>,
    ) -> ScheduleResult<bool> {
        if step <= 0 {
            return Err(ScheduleError::InvalidArgument(format!("step must be positive, got {step}")));
        }
        let range = TimeRange::fixed_step(start, step, values.len())?;
        if range.end == Timestamp::MAX && !values.is_empty() {
            return Err(ScheduleError::InvalidArgument(format!(
                "{} samples every {step} ms from {start} overflow the time axis",
                values.len()
            )));
        }
        let samples: Vec<SampledValue> = values
            .iter()
            .enumerate()
            .map(|(i, v)| SampledValue::new(start.offset(step.saturating_mul(i as i64)), v.clone()))
            .collect();
        self.guarded("replace_values_fixed_step", Boundary::Transaction, |store| {
            store.replace(range, &samples, calculated_at).map(|()| samples.len())
        })
    }

    /// Replace everything in `[start, end)` with `samples`.  A sample outside
    /// the range rejects the whole call with `InvalidArgument`.
    pub fn replace_values(
        &self,
        start:   Timestamp,
        end:     Timestamp,
        samples: &[SampledValue],
    ) -> ScheduleResult<bool> {
        let range = TimeRange::new(start, end)?;
        if let Some(s) = samples.iter().find(|s| !range.contains(s.timestamp)) {
            return Err(ScheduleError::InvalidArgument(format!(
                "sample at {} lies outside {range}",
                s.timestamp
            )));
        }
        self.guarded("replace_values", Boundary::Transaction, |store| {
            store.replace(range, samples, None).map(|()| samples.len())
        })
    }

    pub fn delete_values(&self) -> ScheduleResult<bool> {
        self.delete_range("delete_values", TimeRange::all())
    }

    /// Delete every sample before `end`.
    pub fn delete_values_until(&self, end: Timestamp) -> ScheduleResult<bool> {
        self.delete_range("delete_values_until", TimeRange::until(end))
    }

    /// Delete every sample in `[start, end)`.  An empty range still counts as
    /// a committed change.
    pub fn delete_values_between(&self, start: Timestamp, end: Timestamp) -> ScheduleResult<bool> {
        let range = TimeRange::new(start, end)?;
        self.delete_range("delete_values_between", range)
    }

    fn delete_range(&self, op: &'static str, range: TimeRange) -> ScheduleResult<bool> {
        self.guarded(op, Boundary::Transaction, |store| store.delete(range))
    }

    /// Change how values between samples are computed.  A metadata write: no
    /// transaction, but stamped and notified like any other mutation.
    pub fn set_interpolation_mode(&self, mode: InterpolationMode) -> ScheduleResult<bool> {
        self.guarded("set_interpolation_mode", Boundary::Metadata, |store| {
            store.set_interpolation_mode(mode).map(|()| 0)
        })
    }

    /// Add every sample in a CSV file (see [`sr_store::csv`]).  The file is
    /// parsed before anything is written.
    pub fn import_csv(&self, path: &Path) -> ScheduleResult<bool> {
        let samples = sr_store::read_samples_csv(path)?;
        self.add_values(&samples)
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// The value at `t` under the current interpolation mode.
    pub fn value_at(&self, t: Timestamp) -> ScheduleResult<Option<SampledValue>> {
        self.read(|store| store.value_at(t))
    }

    /// First sample at or after `t`.
    pub fn next_value(&self, t: Timestamp) -> ScheduleResult<Option<SampledValue>> {
        self.read(|store| store.next_sample(t))
    }

    /// Last sample at or before `t`.
    pub fn previous_value(&self, t: Timestamp) -> ScheduleResult<Option<SampledValue>> {
        self.read(|store| store.previous_sample(t))
    }

    pub fn values_from(&self, start: Timestamp) -> ScheduleResult<Vec<SampledValue>> {
        self.read(|store| store.samples(TimeRange::since(start)))
    }

    /// Samples in `[start, end)`, ascending.
    pub fn values(&self, start: Timestamp, end: Timestamp) -> ScheduleResult<Vec<SampledValue>> {
        let range = TimeRange::new(start, end)?;
        self.read(|store| store.samples(range))
    }

    pub fn len(&self) -> ScheduleResult<usize> {
        self.read(|store| store.count(TimeRange::all()))
    }

    pub fn len_between(&self, start: Timestamp, end: Timestamp) -> ScheduleResult<usize> {
        let range = TimeRange::new(start, end)?;
        self.read(|store| store.count(range))
    }

    pub fn is_empty(&self) -> ScheduleResult<bool> {
        self.read(|store| store.is_empty(TimeRange::all()))
    }

    pub fn is_empty_between(&self, start: Timestamp, end: Timestamp) -> ScheduleResult<bool> {
        let range = TimeRange::new(start, end)?;
        self.read(|store| store.is_empty(range))
    }

    /// Lazy ascending walk over every sample.
    pub fn iter(&self) -> ScheduleResult<SampleIter> {
        self.iter_range(TimeRange::all())
    }

    /// Lazy ascending walk over `[start, end)`.
    pub fn iter_between(&self, start: Timestamp, end: Timestamp) -> ScheduleResult<SampleIter> {
        self.iter_range(TimeRange::new(start, end)?)
    }

    fn iter_range(&self, range: TimeRange) -> ScheduleResult<SampleIter> {
        let Resolved { store, .. } = self.tree.resolve(&self.path)?;
        Ok(SampleIter::new(store, range, self.tree.context().config.lock_timeout_ms))
    }

    pub fn interpolation_mode(&self) -> ScheduleResult<InterpolationMode> {
        self.read(|store| store.interpolation_mode())
    }

    /// Time of the most recent committed mutation; `None` if never written.
    pub fn last_update_time(&self) -> ScheduleResult<Option<Timestamp>> {
        self.tree.last_update(&self.path)
    }

    pub fn last_calculation_time(&self) -> ScheduleResult<Option<Timestamp>> {
        self.read(|store| store.last_calculation_time())
    }

    /// Write every sample to a CSV file.  Returns the number of rows.
    pub fn export_csv(&self, path: &Path) -> ScheduleResult<usize> {
        let samples = self.read(|store| store.samples(TimeRange::all()))?;
        Ok(sr_store::write_samples_csv(path, samples)?)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn read<T>(&self, f: impl FnOnce(&dyn TimeSeriesStore) -> StoreResult<T>) -> ScheduleResult<T> {
        let resolved = self.tree.resolve(&self.path)?;
        let store = self.tree.read_store(&resolved.store)?;
        Ok(f(&**store)?)
    }

    /// Run `f` under the guarded-mutation protocol described in the module
    /// docs.  `f` returns the number of samples it touched, for logging.
    fn guarded<F>(&self, op: &'static str, boundary: Boundary, f: F) -> ScheduleResult<bool>
    where
        F: FnOnce(&mut dyn TimeSeriesStore) -> StoreResult<usize>,
    {
        let ctx = self.tree.context();

        // ① Soft probe.
        let resolved = match self.tree.resolve(&self.path) {
            Ok(r) => r,
            Err(ScheduleError::NotFound(_)) => {
                tracing::debug!(path = %self.path, op, "mutation on missing schedule ignored");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        let mut guarded = vec![&self.path];
        if resolved.location != self.path {
            guarded.push(&resolved.location);
        }
        if let Some(denied) = guarded.iter().find(|p| !ctx.access.has_write_access(p)) {
            tracing::warn!(path = %self.path, denied = %denied, op, "write access denied");
            return Ok(false);
        }

        // ② Strict check.
        for p in &guarded {
            if let Err(e) = ctx.access.check_write_permission(p) {
                tracing::warn!(path = %self.path, denied = %p, op, "write permission check failed");
                return Err(e.into());
            }
        }

        // ③ One store call, inside a transaction unless it only touches metadata.
        let touched = {
            let tx = match boundary {
                Boundary::Transaction => Some(ctx.transactions.begin()?),
                Boundary::Metadata => None,
            };
            // The schedule may have been deleted or relinked while we waited.
            let current = match self.tree.resolve(&self.path) {
                Ok(c) if c.id == resolved.id => c,
                Ok(_) | Err(ScheduleError::NotFound(_)) => return Ok(false),
                Err(e) => return Err(e),
            };
            let mut store = self.tree.write_store(&current.store)?;
            let touched = f(&mut **store)?;
            drop(store);
            if let Some(tx) = tx {
                tx.commit();
            }
            touched
        };

        // ④ Stamp.
        let Some(stamped) = self.tree.stamp(&resolved.location, resolved.id, ctx.clock.now())? else {
            tracing::debug!(path = %self.path, op, "schedule removed before stamping; not notified");
            return Ok(true);
        };

        // ⑤ Notify.
        tracing::debug!(path = %self.path, op, samples = touched, "schedule updated");
        ctx.notifications.notify(ChangeEvent::value_changed(resolved.location, Some(stamped)));
        ctx.deliver();
        Ok(true)
    }
}

/// `Timestamp::MAX` is the open end of every unbounded range and cannot hold
/// a sample.
fn storable(samples: &[SampledValue]) -> ScheduleResult<()> {
    match sr_store::check_storable(samples) {
        Err(StoreError::InvalidArgument(msg)) => Err(ScheduleError::InvalidArgument(msg)),
        other => Ok(other?),
    }
}
