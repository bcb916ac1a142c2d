use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::cache::{BufferPool, BufferPoolStats};
use crate::gnis::name_key;
use crate::index::{
    HashIndex, HashIndexStats, InsertOutcome, NameEntry, QuadTree, QuadTreeStats, SpatialEntry,
};
use crate::store::{FileStore, RecordStore};
use crate::types::{GeoPoint, GisError, Locator, Rect, Result};

use super::config::GisOptions;

/// A record line held by the buffer pool together with where it lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PooledRecord {
    /// Store offset of the line.
    pub locator: Locator,
    /// Raw record text.
    pub line: String,
}

/// Where a resolved record was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// Buffer pool hit.
    Pool,
    /// Read from the record store.
    Store,
}

/// A record returned by a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRecord {
    /// Store offset of the line.
    pub locator: Locator,
    /// Raw record text.
    pub line: String,
    /// Whether the pool or the store supplied the line.
    pub source: RecordSource,
}

/// What happened to the spatial side of an import.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpatialOutcome {
    /// Filed in the quadtree.
    Indexed(InsertOutcome),
    /// The coordinate lies outside the world.
    OutOfWorld,
    /// The record carried no coordinate.
    NoCoordinate,
}

/// Result of [`GisDb::import_record`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Where the line was appended.
    pub locator: Locator,
    /// `true` when the name key had not been seen before.
    pub new_name: bool,
    /// Spatial index result.
    pub spatial: SpatialOutcome,
}

/// Snapshot of every structure owned by a [`GisDb`].
#[derive(Clone, Debug, Serialize)]
pub struct GisStats {
    /// Name index shape.
    pub names: HashIndexStats,
    /// Quadtree shape; `None` before `world`.
    pub spatial: Option<QuadTreeStats>,
    /// Pool hit and miss counters.
    pub pool: BufferPoolStats,
    /// Records currently pooled.
    pub pool_len: usize,
    /// Pool capacity.
    pub pool_capacity: usize,
    /// Bytes appended to the store.
    pub store_bytes: u64,
}

/// Owns the indexes, the buffer pool and the record store, and answers
/// queries by checking the pool before reading the store.
pub struct GisDb<S: RecordStore = FileStore> {
    store: S,
    names: HashIndex,
    spatial: Option<QuadTree>,
    pool: BufferPool<PooledRecord>,
    options: GisOptions,
}

impl GisDb<FileStore> {
    /// Creates (or truncates) the database file at `path`.
    pub fn create(path: impl AsRef<Path>, options: GisOptions) -> Result<Self> {
        let store = FileStore::create(path.as_ref())?;
        info!(path = %path.as_ref().display(), "db.create");
        Self::with_store(store, options)
    }
}

impl<S: RecordStore> GisDb<S> {
    /// Builds a database over an existing store.
    pub fn with_store(store: S, options: GisOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            store,
            names: HashIndex::new(options.hash_slots, options.load_limit)?,
            spatial: None,
            pool: BufferPool::new(options.pool_capacity)?,
            options,
        })
    }

    /// Options the database was built with.
    pub fn options(&self) -> &GisOptions {
        &self.options
    }

    /// Sets the world boundaries, discarding any previous spatial index.
    pub fn set_world(&mut self, universe: Rect) -> Result<()> {
        let tree = QuadTree::new(universe, self.options.bucket_capacity)?;
        if let Some(old) = self.spatial.replace(tree) {
            debug!(points = old.len(), "db.world.replaced");
        }
        info!(world = %universe, "db.world.set");
        Ok(())
    }

    /// Current world boundaries, if set.
    pub fn world(&self) -> Option<Rect> {
        self.spatial.as_ref().map(QuadTree::universe)
    }

    /// Appends `line` to the store and indexes it under `key` and, when given,
    /// under `point`. Requires the world to be set when a point is supplied.
    pub fn import_record(
        &mut self,
        line: &str,
        key: &str,
        point: Option<GeoPoint>,
    ) -> Result<ImportOutcome> {
        if point.is_some() && self.spatial.is_none() {
            return Err(GisError::WorldNotSet);
        }
        let locator = self.store.append(line)?;
        let new_name = self.names.insert(NameEntry::new(key, locator));
        let spatial = match (point, self.spatial.as_mut()) {
            (Some(point), Some(tree)) => match tree.insert_entry(SpatialEntry::new(point, locator))
            {
                Some(outcome) => SpatialOutcome::Indexed(outcome),
                None => SpatialOutcome::OutOfWorld,
            },
            _ => SpatialOutcome::NoCoordinate,
        };
        trace!(%locator, key, ?spatial, "db.import.record");
        Ok(ImportOutcome {
            locator,
            new_name,
            spatial,
        })
    }

    /// Every record imported under `name:state`, in import order.
    pub fn what_is(&mut self, name: &str, state: &str) -> Result<Vec<ResolvedRecord>> {
        let key = name_key(name, state);
        let locators: Vec<Locator> = match self.names.find(&key) {
            Some(entry) => entry.locators().iter().collect(),
            None => return Ok(Vec::new()),
        };
        self.resolve(&locators)
    }

    /// Every record located exactly at `point`.
    pub fn what_is_at(&mut self, point: GeoPoint) -> Result<Vec<ResolvedRecord>> {
        let tree = self.spatial.as_ref().ok_or(GisError::WorldNotSet)?;
        let locators: Vec<Locator> = match tree.find(point) {
            Some(set) => set.iter().collect(),
            None => return Ok(Vec::new()),
        };
        self.resolve(&locators)
    }

    /// Every record whose coordinate lies inside `rect`, bounds inclusive.
    pub fn what_is_in(&mut self, rect: Rect) -> Result<Vec<ResolvedRecord>> {
        if !rect.is_well_formed() {
            return Err(GisError::InvalidArgument(format!(
                "query rectangle {rect} is inverted"
            )));
        }
        let tree = self.spatial.as_ref().ok_or(GisError::WorldNotSet)?;
        let locators: Vec<Locator> = tree
            .query_rect(&rect)
            .into_iter()
            .flat_map(|entry| entry.locators().iter())
            .collect();
        self.resolve(&locators)
    }

    fn resolve(&mut self, locators: &[Locator]) -> Result<Vec<ResolvedRecord>> {
        let mut out = Vec::with_capacity(locators.len());
        for &locator in locators {
            let cached = self.pool.find(|r| r.locator == locator).cloned();
            let (record, source) = match cached {
                Some(record) => (record, RecordSource::Pool),
                None => {
                    let line = self.store.read(locator)?;
                    (PooledRecord { locator, line }, RecordSource::Store)
                }
            };
            out.push(ResolvedRecord {
                locator,
                line: record.line.clone(),
                source,
            });
            self.pool.insert(record);
        }
        Ok(out)
    }

    /// The name index.
    pub fn names(&self) -> &HashIndex {
        &self.names
    }

    /// The quadtree, once the world is set.
    pub fn spatial(&self) -> Option<&QuadTree> {
        self.spatial.as_ref()
    }

    /// The buffer pool.
    pub fn pool(&self) -> &BufferPool<PooledRecord> {
        &self.pool
    }

    /// The record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of all structures.
    pub fn stats(&self) -> GisStats {
        GisStats {
            names: self.names.stats(),
            spatial: self.spatial.as_ref().map(QuadTree::stats),
            pool: self.pool.stats(),
            pool_len: self.pool.len(),
            pool_capacity: self.pool.capacity(),
            store_bytes: self.store.len(),
        }
    }
}
