//! Bulk import of GNIS extract files.

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use tracing::{info, warn};

use super::CliError;
use crate::coord::CoordError;
use crate::db::{GisDb, SpatialOutcome};
use crate::gnis::{self, GnisRecord};
use crate::index::InsertOutcome;
use crate::store::RecordStore;
use crate::types::GisError;

/// Counters for one imported file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records appended to the store.
    pub records: u64,
    /// Records whose `name:state` key was new to the name index.
    pub new_names: u64,
    /// Records that added a new coordinate to the quadtree.
    pub new_points: u64,
    /// Records whose coordinate was already present.
    pub merged_points: u64,
    /// Records with a coordinate outside the world, indexed by name only.
    pub out_of_world: u64,
    /// Records without a usable primary coordinate.
    pub missing_coordinates: u64,
    /// Lines skipped because they were not valid records.
    pub malformed: u64,
}

impl ImportSummary {
    fn record(&mut self, new_name: bool, spatial: SpatialOutcome) {
        self.records += 1;
        if new_name {
            self.new_names += 1;
        }
        match spatial {
            SpatialOutcome::Indexed(InsertOutcome::Added) => self.new_points += 1,
            SpatialOutcome::Indexed(_) => self.merged_points += 1,
            SpatialOutcome::OutOfWorld => self.out_of_world += 1,
            SpatialOutcome::NoCoordinate => self.missing_coordinates += 1,
        }
    }
}

/// Imports every record of the pipe-delimited file at `path`, skipping its
/// header row. The world must already be set.
pub fn import_file<S: RecordStore>(
    db: &mut GisDb<S>,
    path: impl AsRef<Path>,
) -> Result<ImportSummary, CliError> {
    let path = path.as_ref();
    if db.world().is_none() {
        return Err(GisError::WorldNotSet.into());
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(gnis::DELIMITER)
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .trim(Trim::None)
        .from_path(path)?;

    let mut summary = ImportSummary::default();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cli.import.skip");
                summary.malformed += 1;
                continue;
            }
        };
        let parsed = match GnisRecord::from_csv(&record) {
            Ok(parsed) => parsed,
            Err(err) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                warn!(path = %path.display(), line, error = %err, "cli.import.skip");
                summary.malformed += 1;
                continue;
            }
        };
        let point = match parsed.point() {
            Ok(point) => Some(point),
            Err(CoordError::Missing) => None,
            Err(err) => {
                warn!(
                    feature = %parsed.feature_id,
                    error = %err,
                    "cli.import.bad_coordinate"
                );
                None
            }
        };
        let outcome = db.import_record(&gnis::to_line(&record), &parsed.name_key(), point)?;
        summary.record(outcome.new_name, outcome.spatial);
    }

    info!(
        path = %path.display(),
        records = summary.records,
        new_names = summary.new_names,
        new_points = summary.new_points,
        out_of_world = summary.out_of_world,
        malformed = summary.malformed,
        "db.import.completed"
    );
    Ok(summary)
}
