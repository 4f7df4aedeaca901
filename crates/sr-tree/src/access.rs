//! Write-access control.
//!
//! Every value mutation asks two questions in order:
//!
//! 1. [`has_write_access`][AccessController::has_write_access] — a soft probe.
//!    `false` makes the call report failure with no side effects.
//! 2. [`check_write_permission`][AccessController::check_write_permission] —
//!    a strict check.  An error here is surfaced to the caller.
//!
//! [`AccessPolicy`] implements both with path-prefix rules that can be changed
//! while the tree is in use.

use parking_lot::RwLock;
use thiserror::Error;

use sr_core::ResourcePath;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("write permission denied for {path}")]
pub struct AccessDenied {
    pub path: ResourcePath,
}

pub trait AccessController: Send + Sync {
    fn has_write_access(&self, path: &ResourcePath) -> bool;

    fn check_write_permission(&self, path: &ResourcePath) -> Result<(), AccessDenied>;
}

/// Grants every write.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllowAll;

impl AccessController for AllowAll {
    fn has_write_access(&self, _path: &ResourcePath) -> bool {
        true
    }

    fn check_write_permission(&self, _path: &ResourcePath) -> Result<(), AccessDenied> {
        Ok(())
    }
}

/// Prefix-based policy.
///
/// | Rule          | `has_write_access` | `check_write_permission` |
/// |---------------|--------------------|--------------------------|
/// | read-only     | `false`            | `Err`                    |
/// | forbidden     | `true`             | `Err`                    |
/// | *(no match)*  | `true`             | `Ok`                     |
///
/// A rule on `a/b` covers `a/b` and everything below it.
#[derive(Debug, Default)]
pub struct AccessPolicy {
    read_only: RwLock<Vec<ResourcePath>>,
    forbidden: RwLock<Vec<ResourcePath>>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `prefix` read-only: writers see the soft probe fail.
    pub fn deny_writes(&self, prefix: ResourcePath) {
        self.read_only.write().push(prefix);
    }

    /// Let the soft probe pass under `prefix` but fail the strict check.
    pub fn forbid(&self, prefix: ResourcePath) {
        self.forbidden.write().push(prefix);
    }

    /// Drop every rule registered for exactly `prefix`.
    pub fn allow(&self, prefix: &ResourcePath) {
        self.read_only.write().retain(|p| p != prefix);
        self.forbidden.write().retain(|p| p != prefix);
    }

    fn covered(rules: &RwLock<Vec<ResourcePath>>, path: &ResourcePath) -> bool {
        rules.read().iter().any(|prefix| path.starts_with(prefix))
    }
}

impl AccessController for AccessPolicy {
    fn has_write_access(&self, path: &ResourcePath) -> bool {
        !Self::covered(&self.read_only, path)
    }

    fn check_write_permission(&self, path: &ResourcePath) -> Result<(), AccessDenied> {
        if Self::covered(&self.read_only, path) || Self::covered(&self.forbidden, path) {
            return Err(AccessDenied { path: path.clone() });
        }
        Ok(())
    }
}
