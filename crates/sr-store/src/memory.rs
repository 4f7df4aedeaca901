//! In-memory backend: a `BTreeMap` keyed by timestamp.
//!
//! `BTreeMap` gives O(log n) point lookups and neighbour queries and lets
//! range deletion be done with two `split_off`s and one `append`, so a
//! delete never walks samples outside the range.

use std::collections::BTreeMap;

use sr_core::{InterpolationMode, Quality, SampledValue, TimeRange, Timestamp, Value};

use crate::store::{check_storable, check_within};
use crate::{StoreError, StoreResult, TimeSeriesStore};

/// A time-series store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    samples:          BTreeMap<Timestamp, (Value, Quality)>,
    mode:             InterpolationMode,
    last_modified:    Option<Timestamp>,
    last_calculation: Option<Timestamp>,
    destroyed:        bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> StoreResult<()> {
        if self.destroyed { Err(StoreError::Destroyed) } else { Ok(()) }
    }

    fn put_all(&mut self, samples: &[SampledValue]) {
        for s in samples {
            self.samples.insert(s.timestamp, (s.value.clone(), s.quality));
        }
    }

    fn remove_range(&mut self, range: TimeRange) -> usize {
        if range.is_empty() {
            return 0;
        }
        let mut inside = self.samples.split_off(&range.start);
        let mut after = inside.split_off(&range.end);
        let removed = inside.len();
        self.samples.append(&mut after);
        removed
    }
}

fn sample((t, (value, quality)): (&Timestamp, &(Value, Quality))) -> SampledValue {
    SampledValue { timestamp: *t, value: value.clone(), quality: *quality }
}

impl TimeSeriesStore for MemoryStore {
    fn insert(
        &mut self,
        samples: &[SampledValue],
        calculated_at: Option<Timestamp>,
    ) -> StoreResult<()> {
        self.live()?;
        check_storable(samples)?;
        self.put_all(samples);
        if calculated_at.is_some() {
            self.last_calculation = calculated_at;
        }
        Ok(())
    }

    fn delete(&mut self, range: TimeRange) -> StoreResult<usize> {
        self.live()?;
        Ok(self.remove_range(range))
    }

    fn replace(
        &mut self,
        range: TimeRange,
        samples: &[SampledValue],
        calculated_at: Option<Timestamp>,
    ) -> StoreResult<()> {
        self.live()?;
        check_within(range, samples)?;
        self.remove_range(range);
        self.put_all(samples);
        if calculated_at.is_some() {
            self.last_calculation = calculated_at;
        }
        Ok(())
    }

    fn set_interpolation_mode(&mut self, mode: InterpolationMode) -> StoreResult<()> {
        self.live()?;
        self.mode = mode;
        Ok(())
    }

    fn set_last_modified(&mut self, at: Option<Timestamp>) -> StoreResult<()> {
        self.live()?;
        self.last_modified = at;
        Ok(())
    }

    fn destroy(&mut self) -> StoreResult<()> {
        self.live()?;
        self.samples.clear();
        self.mode = InterpolationMode::None;
        self.last_modified = None;
        self.last_calculation = None;
        self.destroyed = true;
        Ok(())
    }

    fn previous_sample(&self, t: Timestamp) -> StoreResult<Option<SampledValue>> {
        self.live()?;
        Ok(self.samples.range(..=t).next_back().map(sample))
    }

    fn next_sample(&self, t: Timestamp) -> StoreResult<Option<SampledValue>> {
        self.live()?;
        Ok(self.samples.range(t..).next().map(sample))
    }

    fn samples(&self, range: TimeRange) -> StoreResult<Vec<SampledValue>> {
        self.live()?;
        if range.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.samples.range(range.start..range.end).map(sample).collect())
    }

    fn count(&self, range: TimeRange) -> StoreResult<usize> {
        self.live()?;
        if range.is_empty() {
            return Ok(0);
        }
        Ok(self.samples.range(range.start..range.end).count())
    }

    fn interpolation_mode(&self) -> StoreResult<InterpolationMode> {
        self.live()?;
        Ok(self.mode)
    }

    fn last_modified(&self) -> StoreResult<Option<Timestamp>> {
        self.live()?;
        Ok(self.last_modified)
    }

    fn last_calculation_time(&self) -> StoreResult<Option<Timestamp>> {
        self.live()?;
        Ok(self.last_calculation)
    }
}
