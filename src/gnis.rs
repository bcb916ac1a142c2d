#![forbid(unsafe_code)]

//! Pipe-delimited GNIS feature records.

use csv::StringRecord;

use crate::coord::{self, CoordError};
use crate::types::{GeoPoint, GisError, Result};

/// Field separator of GNIS extract files.
pub const DELIMITER: u8 = b'|';

const FEATURE_ID: usize = 0;
const NAME: usize = 1;
const CLASS: usize = 2;
const STATE: usize = 3;
const COUNTY: usize = 5;
const PRIMARY_LAT: usize = 7;
const PRIMARY_LONG: usize = 8;
const MIN_FIELDS: usize = PRIMARY_LONG + 1;

/// The fields of a GNIS record the indexer cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GnisRecord {
    /// GNIS feature id.
    pub feature_id: String,
    /// Feature name.
    pub name: String,
    /// Feature class, e.g. `Summit`.
    pub class: String,
    /// State abbreviation.
    pub state: String,
    /// County name.
    pub county: String,
    /// Primary latitude in DMS text, `Unknown` when absent.
    pub latitude: String,
    /// Primary longitude in DMS text, `Unknown` when absent.
    pub longitude: String,
}

impl GnisRecord {
    /// Parses one line as stored in the record store.
    pub fn parse(line: &str) -> Result<Self> {
        Self::from_fields(line.split(DELIMITER as char))
    }

    /// Builds a record from a parsed row; requires a name and a state.
    pub fn from_csv(record: &StringRecord) -> Result<Self> {
        Self::from_fields(record.iter())
    }

    fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<&str> = fields.into_iter().collect();
        if fields.len() < MIN_FIELDS {
            return Err(GisError::InvalidRecord(format!(
                "expected at least {MIN_FIELDS} fields, found {}",
                fields.len()
            )));
        }
        let name = fields[NAME].trim();
        let state = fields[STATE].trim();
        if name.is_empty() || state.is_empty() {
            return Err(GisError::InvalidRecord(format!(
                "feature {} has no name or state",
                fields[FEATURE_ID]
            )));
        }
        Ok(Self {
            feature_id: fields[FEATURE_ID].trim().to_owned(),
            name: name.to_owned(),
            class: fields[CLASS].trim().to_owned(),
            state: state.to_owned(),
            county: fields[COUNTY].trim().to_owned(),
            latitude: fields[PRIMARY_LAT].trim().to_owned(),
            longitude: fields[PRIMARY_LONG].trim().to_owned(),
        })
    }

    /// Key used by the name index.
    pub fn name_key(&self) -> String {
        name_key(&self.name, &self.state)
    }

    /// Primary coordinate, longitude on `x` and latitude on `y`.
    pub fn point(&self) -> std::result::Result<GeoPoint, CoordError> {
        let y = coord::parse_latitude(&self.latitude)?;
        let x = coord::parse_longitude(&self.longitude)?;
        Ok(GeoPoint::new(x, y))
    }
}

/// Builds the `name:state` key shared by import and `what_is`.
pub fn name_key(name: &str, state: &str) -> String {
    format!("{name}:{state}")
}

/// Joins csv fields back into the stored line form.
pub fn to_line(record: &StringRecord) -> String {
    let mut line = String::new();
    for (i, field) in record.iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER as char);
        }
        line.push_str(field);
    }
    line
}
