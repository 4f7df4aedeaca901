//! Transaction boundary for store mutations.
//!
//! [`TransactionManager::begin`] hands out a [`Transaction`] guard.  Only one
//! guard exists at a time across the whole tree, so at most one store
//! mutation is in flight.  The guard must be [`commit`][Transaction::commit]ted
//! explicitly; dropping it without a commit counts as a rollback.  Either way
//! the manager sees exactly one finish per begin, on every exit path.
//!
//! The gate is not re-entrant: beginning a second transaction on a thread
//! that already holds one times out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::{TreeError, TreeResult};

pub struct TransactionManager {
    gate:        Mutex<()>,
    timeout_ms:  u64,
    begun:       AtomicU64,
    committed:   AtomicU64,
    rolled_back: AtomicU64,
}

/// Counters reported by [`TransactionManager::stats`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TransactionStats {
    pub begun:       u64,
    pub committed:   u64,
    pub rolled_back: u64,
}

impl TransactionStats {
    /// Transactions begun but not yet finished.
    pub fn open(&self) -> u64 {
        self.begun - self.committed - self.rolled_back
    }
}

impl TransactionManager {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            gate:        Mutex::new(()),
            timeout_ms,
            begun:       AtomicU64::new(0),
            committed:   AtomicU64::new(0),
            rolled_back: AtomicU64::new(0),
        }
    }

    /// Wait up to the configured timeout for the gate, then open a transaction.
    pub fn begin(&self) -> TreeResult<Transaction<'_>> {
        let timeout_ms = self.timeout_ms;
        let Some(gate) = self.gate.try_lock_for(Duration::from_millis(timeout_ms)) else {
            tracing::warn!(timeout_ms, "transaction begin timed out");
            return Err(TreeError::TransactionTimeout { timeout_ms });
        };
        let id = self.begun.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(tx = id, "transaction begun");
        Ok(Transaction { _gate: gate, manager: self, id, committed: false })
    }

    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            begun:       self.begun.load(Ordering::Relaxed),
            committed:   self.committed.load(Ordering::Relaxed),
            rolled_back: self.rolled_back.load(Ordering::Relaxed),
        }
    }
}

/// An open transaction.  See the [module docs](self).
pub struct Transaction<'a> {
    _gate:     MutexGuard<'a, ()>,
    manager:   &'a TransactionManager,
    id:        u64,
    committed: bool,
}

impl Transaction<'_> {
    /// Sequence number of this transaction, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Mark the transaction successful and release the gate.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            self.manager.committed.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(tx = self.id, "transaction committed");
        } else {
            self.manager.rolled_back.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(tx = self.id, "transaction rolled back");
        }
    }
}
