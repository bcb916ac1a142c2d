#![forbid(unsafe_code)]

//! In-memory indexes rebuilt from the record store on every run.
//!
//! Both indexes store locators rather than record text; the name index is a
//! chained hash table keyed by `name:state`, the spatial index a PR quadtree.

mod entry;
mod hash;
mod quadtree;

pub use entry::{LocatorSet, NameEntry, SpatialEntry};
pub use hash::{fnv_hash, HashIndex, HashIndexStats, DEFAULT_HASH_SLOTS, DEFAULT_LOAD_LIMIT};
pub use quadtree::{
    InsertOutcome, NodeKind, QuadTree, QuadTreeStats, Quadrant, DEFAULT_BUCKET_CAPACITY,
};
