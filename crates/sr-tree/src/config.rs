//! Tree configuration.
//!
//! ```json
//! {
//!   "lock_timeout_ms": 5000,
//!   "transaction_timeout_ms": 5000,
//!   "deliver_immediately": true,
//!   "store": { "backend": "sqlite", "path": "schedules.db" }
//! }
//! ```
//!
//! Every field is optional; missing fields take their [`Default`] values.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{TreeError, TreeResult};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Upper bound on waiting for the structural lock.
    pub lock_timeout_ms:        u64,
    /// Upper bound on waiting to begin a transaction.
    pub transaction_timeout_ms: u64,
    /// Flush notifications as soon as a mutation completes.  When `false` the
    /// application calls `NotificationHub::flush` itself.
    pub deliver_immediately:    bool,
    pub store:                  StoreBackend,
}

/// Where new schedules keep their samples.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    /// One SQLite file shared by every schedule.
    Sqlite { path: PathBuf },
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms:        5_000,
            transaction_timeout_ms: 5_000,
            deliver_immediately:    true,
            store:                  StoreBackend::Memory,
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> TreeResult<()> {
        if self.lock_timeout_ms == 0 {
            return Err(TreeError::Config("lock_timeout_ms must be positive".into()));
        }
        if self.transaction_timeout_ms == 0 {
            return Err(TreeError::Config("transaction_timeout_ms must be positive".into()));
        }
        if let StoreBackend::Sqlite { path } = &self.store {
            if path.as_os_str().is_empty() {
                return Err(TreeError::Config("sqlite store path is empty".into()));
            }
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}
