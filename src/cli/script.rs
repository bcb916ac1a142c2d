//! Tab-separated command scripts.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::{self, CoordError};
use crate::types::{GeoPoint, Rect};

/// Which structure a `show` command dumps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowTarget {
    /// The quadtree structure.
    Quad,
    /// The name index table.
    Hash,
    /// The buffer pool, MRU first.
    Pool,
}

impl fmt::Display for ShowTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShowTarget::Quad => "quad",
            ShowTarget::Hash => "hash",
            ShowTarget::Pool => "pool",
        })
    }
}

/// One parsed script command. Coordinates are already converted to seconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `world`: sets the quadtree universe.
    World(Rect),
    /// `import`: loads a GNIS file.
    Import(PathBuf),
    /// `what_is`: lookup by name and state.
    WhatIs {
        /// Feature name.
        name: String,
        /// State abbreviation.
        state: String,
    },
    /// `what_is_at`: exact coordinate lookup.
    WhatIsAt(GeoPoint),
    /// `what_is_in`: rectangle around a center point.
    WhatIsIn {
        /// Center of the search rectangle.
        center: GeoPoint,
        /// Seconds of latitude above and below the center.
        half_height: i64,
        /// Seconds of longitude either side of the center.
        half_width: i64,
    },
    /// `show`: dumps one structure into the log.
    Show(ShowTarget),
    /// `quit`: stops processing.
    Quit,
}

impl Command {
    /// Script keyword of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::World(_) => "world",
            Command::Import(_) => "import",
            Command::WhatIs { .. } => "what_is",
            Command::WhatIsAt(_) => "what_is_at",
            Command::WhatIsIn { .. } => "what_is_in",
            Command::Show(_) => "show",
            Command::Quit => "quit",
        }
    }
}

/// Reasons a script line cannot be turned into a [`Command`].
#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    /// First field is not a known command.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    /// Wrong number of arguments.
    #[error("`{command}` takes {expected} argument(s), found {found}")]
    Arity {
        /// Command keyword.
        command: &'static str,
        /// Arguments the command takes.
        expected: usize,
        /// Arguments on the line.
        found: usize,
    },
    /// A numeric argument did not parse.
    #[error("`{value}` is not a valid {what}")]
    Number {
        /// What the argument means.
        what: &'static str,
        /// Text as written.
        value: String,
    },
    /// Unknown `show` target.
    #[error("`show` target must be quad, hash or pool, found `{0}`")]
    ShowTarget(String),
    /// West is east of east, or south is north of north.
    #[error("world boundaries are inverted")]
    InvertedWorld,
    /// Malformed DMS coordinate.
    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// Parses one script line. Blank lines and `;` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ScriptError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with(';') {
        return Ok(None);
    }
    let mut fields = line.split('\t').map(str::trim).filter(|f| !f.is_empty());
    let Some(head) = fields.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = fields.collect();
    let command = match head {
        "world" => {
            let [west, east, south, north] = take::<4>("world", &args)?;
            let world = Rect::new(
                coord::parse_longitude(west)?,
                coord::parse_longitude(east)?,
                coord::parse_latitude(south)?,
                coord::parse_latitude(north)?,
            );
            if !world.is_well_formed() {
                return Err(ScriptError::InvertedWorld);
            }
            Command::World(world)
        }
        "import" => {
            let [path] = take::<1>("import", &args)?;
            Command::Import(PathBuf::from(path))
        }
        "what_is" => {
            let [name, state] = take::<2>("what_is", &args)?;
            Command::WhatIs {
                name: name.to_owned(),
                state: state.to_owned(),
            }
        }
        "what_is_at" => {
            let [lat, long] = take::<2>("what_is_at", &args)?;
            Command::WhatIsAt(point(lat, long)?)
        }
        "what_is_in" => {
            let [lat, long, half_height, half_width] = take::<4>("what_is_in", &args)?;
            Command::WhatIsIn {
                center: point(lat, long)?,
                half_height: seconds("half height", half_height)?,
                half_width: seconds("half width", half_width)?,
            }
        }
        "show" => {
            let [target] = take::<1>("show", &args)?;
            Command::Show(match target {
                "quad" => ShowTarget::Quad,
                "hash" => ShowTarget::Hash,
                "pool" => ShowTarget::Pool,
                other => return Err(ScriptError::ShowTarget(other.to_owned())),
            })
        }
        "quit" => {
            take::<0>("quit", &args)?;
            Command::Quit
        }
        other => return Err(ScriptError::UnknownCommand(other.to_owned())),
    };
    Ok(Some(command))
}

fn take<'a, const N: usize>(
    command: &'static str,
    args: &[&'a str],
) -> Result<[&'a str; N], ScriptError> {
    <[&str; N]>::try_from(args).map_err(|_| ScriptError::Arity {
        command,
        expected: N,
        found: args.len(),
    })
}

fn point(lat: &str, long: &str) -> Result<GeoPoint, ScriptError> {
    let y = coord::parse_latitude(lat)?;
    let x = coord::parse_longitude(long)?;
    Ok(GeoPoint::new(x, y))
}

fn seconds(what: &'static str, value: &str) -> Result<i64, ScriptError> {
    value
        .parse::<i64>()
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| ScriptError::Number {
            what,
            value: value.to_owned(),
        })
}
