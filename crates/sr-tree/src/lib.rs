//! `sr-tree` — the resource-tree collaborators schedule resources run against.
//!
//! None of these know anything about time series.  They are the contracts the
//! schedule layer needs from the surrounding tree, each with a simple
//! in-process implementation:
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`lock`]        | `StructuralLock` — timeout-bounded tree-wide RW lock       |
//! | [`transaction`] | `TransactionManager`, RAII `Transaction` guard             |
//! | [`access`]      | `AccessController` trait, `AllowAll`, `AccessPolicy`       |
//! | [`notify`]      | `NotificationHub`, `ResourceListener`, `ChangeEvent`       |
//! | [`config`]      | `TreeConfig`, `StoreBackend`                               |
//! | [`context`]     | `TreeContext` bundling all of the above plus a `Clock`     |
//!
//! # Lock order
//!
//! ```text
//! structural lock  →  transaction  →  (schedule node table  →  store)
//! ```
//!
//! Notifications are flushed only after every lock has been released.

pub mod access;
pub mod config;
pub mod context;
pub mod error;
pub mod lock;
pub mod notify;
pub mod transaction;

#[cfg(test)]
mod tests;

pub use access::{AccessController, AccessDenied, AccessPolicy, AllowAll};
pub use config::{StoreBackend, TreeConfig};
pub use context::{TreeContext, TreeContextBuilder};
pub use error::{TreeError, TreeResult};
pub use lock::{StructuralLock, StructuralReadGuard, StructuralWriteGuard};
pub use notify::{ChangeEvent, ChangeKind, NotificationHub, ResourceListener};
pub use transaction::{Transaction, TransactionManager, TransactionStats};
