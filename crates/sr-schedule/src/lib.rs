//! `sr-schedule` — schedule resources: time series that live at paths in a
//! shared resource tree and are mutated under a transactional protocol.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`tree`]       | `ScheduleTree` — path → node registry, store factory      |
//! | [`resource`]   | `ScheduleResource` — guarded mutations and reads          |
//! | [`lifecycle`]  | `create`, `create_reference`, `delete`, `set_as_reference`|
//! | [`link`]       | `StoreLink` — owned store or weak alias                   |
//! | [`iter`]       | `SampleIter` — lazy ascending sample walk                 |
//! | [`error`]      | `ScheduleError`, `ScheduleResult<T>`                      |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                      |
//! |-----------|-------------------------------------------------------------|
//! | `sqlite`  | Enables `StoreBackend::Sqlite` (via `sr-store/sqlite`).     |
//! | `fx-hash` | FxHash instead of SipHash for the node table.               |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sr_schedule::ScheduleTree;
//! use sr_tree::TreeContextBuilder;
//!
//! let tree = ScheduleTree::new(TreeContextBuilder::new().build()?)?;
//! let s = tree.create("house/heating/setpoint".parse()?)?;
//! s.add_value(Timestamp(100), 21.5)?;
//! assert_eq!(s.value_at(Timestamp(100))?.map(|v| v.value), Some(Value::Float(21.5)));
//! ```

pub mod error;
pub mod iter;
pub mod lifecycle;
pub mod link;
pub mod resource;
pub mod tree;


pub use error::{ScheduleError, ScheduleResult};
pub use iter::SampleIter;
pub use link::{SharedStore, StoreLink};
pub use resource::ScheduleResource;
pub use tree::ScheduleTree;
