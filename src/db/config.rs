use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_POOL_CAPACITY;
use crate::index::{DEFAULT_BUCKET_CAPACITY, DEFAULT_HASH_SLOTS, DEFAULT_LOAD_LIMIT};
use crate::types::{GisError, Result};

/// Sizing of the indexes and the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GisOptions {
    /// Initial name index slot count.
    pub hash_slots: usize,
    /// Name index load factor that triggers a doubling rehash.
    pub load_limit: f64,
    /// Entries a quadtree leaf holds before it splits.
    pub bucket_capacity: usize,
    /// Records kept by the buffer pool.
    pub pool_capacity: usize,
}

impl Default for GisOptions {
    fn default() -> Self {
        Self {
            hash_slots: DEFAULT_HASH_SLOTS,
            load_limit: DEFAULT_LOAD_LIMIT,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl GisOptions {
    /// Small tables that split and rehash early; handy for exercising growth.
    pub fn compact() -> Self {
        Self {
            hash_slots: 4,
            load_limit: DEFAULT_LOAD_LIMIT,
            bucket_capacity: 1,
            pool_capacity: 4,
        }
    }

    /// Larger buckets and pool for bulk imports followed by many queries.
    pub fn bulk() -> Self {
        Self {
            hash_slots: 4096,
            load_limit: DEFAULT_LOAD_LIMIT,
            bucket_capacity: 8,
            pool_capacity: 64,
        }
    }

    /// Rejects zero sizes and non-positive load limits.
    pub fn validate(&self) -> Result<()> {
        if self.hash_slots == 0 {
            return Err(GisError::InvalidArgument(
                "hash_slots must be at least 1".into(),
            ));
        }
        if !(self.load_limit > 0.0 && self.load_limit.is_finite()) {
            return Err(GisError::InvalidArgument(format!(
                "load_limit must be positive, got {}",
                self.load_limit
            )));
        }
        if self.bucket_capacity == 0 {
            return Err(GisError::InvalidArgument(
                "bucket_capacity must be at least 1".into(),
            ));
        }
        if self.pool_capacity == 0 {
            return Err(GisError::InvalidArgument(
                "pool_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
