//! `sr-core` — foundational types for the schedule-resource framework.
//!
//! This crate is a dependency of every other `sr-*` crate.  It has no `sr-*`
//! dependencies and minimal external ones (only `thiserror`, plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module            | Contents                                              |
//! |-------------------|-------------------------------------------------------|
//! | [`ids`]           | `StoreId`, `ListenerId`, `IdAllocator`                |
//! | [`path`]          | `ResourcePath`                                        |
//! | [`time`]          | `Timestamp`, `TimeRange`, `Clock`, `SystemClock`, `ManualClock` |
//! | [`value`]         | `Value`, `Quality`, `SampledValue`                    |
//! | [`interpolation`] | `InterpolationMode`, `interpolate`                    |
//! | [`error`]         | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod interpolation;
pub mod path;
pub mod time;
pub mod value;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{IdAllocator, ListenerId, StoreId};
pub use interpolation::{InterpolationMode, interpolate};
pub use path::ResourcePath;
pub use time::{Clock, ManualClock, SystemClock, TimeRange, Timestamp};
pub use value::{Quality, SampledValue, Value};
