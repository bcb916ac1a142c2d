//! Geodex indexes GNIS feature records kept in an append-only text store.
//!
//! Records are found by `name:state` through a chained hash index or by
//! coordinate through a PR quadtree; both hand back byte offsets into the
//! store, and a small most-recently-used pool fronts the store reads.

#![warn(missing_docs)]

pub mod cache;
pub mod cli;
pub mod coord;
pub mod db;
pub mod gnis;
pub mod index;
pub mod logging;
pub mod store;
pub mod types;

pub use db::{GisDb, GisOptions};
pub use types::{GeoPoint, GisError, Locator, Rect, Result};
