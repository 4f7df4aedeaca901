//! `sr-store` — time-series storage backends for schedule resources.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend       | Persistence                                   |
//! |-----------|---------------|-----------------------------------------------|
//! | *(none)*  | `MemoryStore` | none (process lifetime)                       |
//! | `sqlite`  | `SqliteStore` | one SQLite file shared by all series          |
//!
//! Both implement [`TimeSeriesStore`] and are allocated through a
//! [`StoreFactory`].  Stores are deliberately *not* synchronized: the schedule
//! layer wraps each one in a lock and serializes writers through its
//! transaction manager.
//!
//! The [`csv`](crate::csv) module reads and writes samples in a flat
//! `timestamp,kind,value,quality` format.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sr_core::{SampledValue, TimeRange, Timestamp};
//! use sr_store::{MemoryStore, TimeSeriesStore};
//!
//! let mut store = MemoryStore::new();
//! store.insert(&[SampledValue::new(Timestamp(100), 5.0)], None)?;
//! assert_eq!(store.count(TimeRange::all())?, 1);
//! ```

pub mod csv;
pub mod error;
pub mod memory;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use crate::csv::{read_samples, read_samples_csv, write_samples, write_samples_csv};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{MemoryStoreFactory, StoreFactory, TimeSeriesStore, check_storable};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteStore, SqliteStoreFactory};
