//! Lazy sample iteration.

use std::iter::FusedIterator;
use std::time::Duration;

use sr_core::{SampledValue, TimeRange, Timestamp};
use sr_tree::TreeError;

use crate::link::SharedStore;
use crate::ScheduleResult;

/// Ascending walk over the samples of one schedule within a range.
///
/// Each step asks the store for the first sample at or after a cursor, holding
/// the store's read lock only for that one lookup.  Writers can therefore
/// commit between steps; the walk sees each sample at most once and never
/// goes backwards.  After the end of the range, or after an error, the
/// iterator is exhausted.
pub struct SampleIter {
    store:           Option<SharedStore>,
    cursor:          Timestamp,
    end:             Timestamp,
    lock_timeout_ms: u64,
}

impl SampleIter {
    pub(crate) fn new(store: SharedStore, range: TimeRange, lock_timeout_ms: u64) -> Self {
        let store = (!range.is_empty()).then_some(store);
        Self { store, cursor: range.start, end: range.end, lock_timeout_ms }
    }
}

impl Iterator for SampleIter {
    type Item = ScheduleResult<SampledValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let store = self.store.as_ref()?;
        let next = store
            .try_read_for(Duration::from_millis(self.lock_timeout_ms))
            .map(|guard| guard.next_sample(self.cursor));
        match next {
            Some(Ok(Some(sample))) if sample.timestamp < self.end => {
                if sample.timestamp == Timestamp::MAX {
                    self.store = None;
                } else {
                    self.cursor = sample.timestamp.successor();
                }
                Some(Ok(sample))
            }
            Some(Ok(_)) => {
                self.store = None;
                None
            }
            Some(Err(e)) => {
                self.store = None;
                Some(Err(e.into()))
            }
            None => {
                self.store = None;
                let timeout_ms = self.lock_timeout_ms;
                Some(Err(TreeError::LockTimeout { what: "store read", timeout_ms }.into()))
            }
        }
    }
}

impl FusedIterator for SampleIter {}
