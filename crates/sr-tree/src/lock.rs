//! Tree-wide structural lock.
//!
//! Node creation and deletion take the write side; anything that must see a
//! stable set of nodes for longer than one table lookup takes the read side.
//! Value mutations never touch this lock.
//!
//! Acquisition is bounded by the configured timeout.  A timeout is reported
//! as [`TreeError::LockTimeout`], never as a hang.

use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{TreeError, TreeResult};

pub struct StructuralLock {
    inner:      RwLock<()>,
    timeout_ms: u64,
}

/// Shared hold on the tree structure.  Released on drop.
pub struct StructuralReadGuard<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

/// Exclusive hold on the tree structure.  Released on drop.
pub struct StructuralWriteGuard<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
}

impl StructuralLock {
    pub fn new(timeout_ms: u64) -> Self {
        Self { inner: RwLock::new(()), timeout_ms }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn read(&self) -> TreeResult<StructuralReadGuard<'_>> {
        match self.inner.try_read_for(self.timeout()) {
            Some(guard) => Ok(StructuralReadGuard { _guard: guard }),
            None => Err(self.timed_out("structural read")),
        }
    }

    pub fn write(&self) -> TreeResult<StructuralWriteGuard<'_>> {
        match self.inner.try_write_for(self.timeout()) {
            Some(guard) => Ok(StructuralWriteGuard { _guard: guard }),
            None => Err(self.timed_out("structural write")),
        }
    }

    fn timed_out(&self, what: &'static str) -> TreeError {
        tracing::warn!(what, timeout_ms = self.timeout_ms, "structural lock acquisition timed out");
        TreeError::LockTimeout { what, timeout_ms: self.timeout_ms }
    }
}
