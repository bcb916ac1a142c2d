//! The coordinator that ties the record store, the indexes and the buffer pool together.

mod config;
mod coordinator;


pub use config::GisOptions;
pub use coordinator::{
    GisDb, GisStats, ImportOutcome, PooledRecord, RecordSource, ResolvedRecord, SpatialOutcome,
};
