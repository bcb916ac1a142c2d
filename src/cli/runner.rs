//! Executes command scripts against a [`GisDb`] and writes the command log.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use super::import::{import_file, ImportSummary};
use super::script::{parse_line, Command, ShowTarget};
use super::CliError;
use crate::coord::{format_latitude, format_longitude};
use crate::db::{GisDb, ResolvedRecord};
use crate::gnis::GnisRecord;
use crate::store::RecordStore;
use crate::types::{GeoPoint, Rect};

const SEPARATOR: &str =
    "------------------------------------------------------------------------------------------";

/// Totals for one script run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Numbered commands, including failed ones.
    pub commands: usize,
    /// Commands that were logged as errors.
    pub failed: usize,
    /// Whether processing stopped at a `quit` command.
    pub quit: bool,
}

enum Report {
    World(Rect),
    Imported(ImportSummary),
    Records(Vec<ResolvedRecord>),
    Dump(String),
    Quit,
}

/// Runs script commands in order, numbering them from 1.
pub struct ScriptRunner<'db, S: RecordStore, W: Write> {
    db: &'db mut GisDb<S>,
    log: W,
    summary: RunSummary,
}

impl<'db, S: RecordStore, W: Write> ScriptRunner<'db, S, W> {
    /// Runs commands against `db`, writing the command log to `log`.
    pub fn new(db: &'db mut GisDb<S>, log: W) -> Self {
        Self {
            db,
            log,
            summary: RunSummary::default(),
        }
    }

    /// Opens `script` and runs it to completion or `quit`.
    pub fn run_file(&mut self, script: impl AsRef<Path>) -> Result<RunSummary, CliError> {
        let file = File::open(script.as_ref())?;
        self.run(BufReader::new(file))
    }

    /// Processes every line until end of input or `quit`. Only failures to
    /// read the script or write the log abort the run.
    pub fn run<R: BufRead>(&mut self, script: R) -> Result<RunSummary, CliError> {
        for line in script.lines() {
            let line = line?;
            if !self.execute_line(&line)? {
                break;
            }
        }
        writeln!(self.log, "{SEPARATOR}")?;
        self.log.flush()?;
        Ok(self.summary)
    }

    /// Runs one line; returns `false` once `quit` has been processed.
    pub fn execute_line(&mut self, line: &str) -> Result<bool, CliError> {
        let command = match parse_line(line) {
            Ok(None) => return Ok(true),
            Ok(Some(command)) => command,
            Err(err) => {
                let number = self.next_number();
                warn!(command = number, error = %err, "cli.script.skip");
                self.write_header(number, line)?;
                self.write_error(&err)?;
                return Ok(true);
            }
        };
        let number = self.next_number();
        debug!(command = number, kind = command.name(), "cli.script.command");
        let outcome = self.execute(&command);
        self.write_header(number, line)?;
        match outcome {
            Ok(report) => self.write_report(&command, report)?,
            Err(err) => {
                warn!(command = number, error = %err, "cli.script.failed");
                self.write_error(&err)?;
            }
        }
        Ok(command != Command::Quit)
    }

    /// Totals so far.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Gives back the log writer.
    pub fn into_log(self) -> W {
        self.log
    }

    fn next_number(&mut self) -> usize {
        self.summary.commands += 1;
        self.summary.commands
    }

    fn execute(&mut self, command: &Command) -> Result<Report, CliError> {
        let report = match command {
            Command::World(world) => {
                self.db.set_world(*world)?;
                Report::World(*world)
            }
            Command::Import(path) => Report::Imported(import_file(&mut *self.db, path)?),
            Command::WhatIs { name, state } => Report::Records(self.db.what_is(name, state)?),
            Command::WhatIsAt(point) => Report::Records(self.db.what_is_at(*point)?),
            Command::WhatIsIn {
                center,
                half_height,
                half_width,
            } => Report::Records(
                self.db
                    .what_is_in(Rect::around(*center, *half_width, *half_height))?,
            ),
            Command::Show(target) => Report::Dump(self.dump(*target)),
            Command::Quit => {
                self.summary.quit = true;
                Report::Quit
            }
        };
        Ok(report)
    }

    fn dump(&self, target: ShowTarget) -> String {
        match target {
            ShowTarget::Quad => match self.db.spatial() {
                Some(tree) => tree.to_string(),
                None => "World boundaries have not been set\n".to_string(),
            },
            ShowTarget::Hash => self.db.names().to_string(),
            ShowTarget::Pool => {
                let pool = self.db.pool();
                let mut out = format!(
                    "Buffer pool holds {} of {} records\nMRU\n",
                    pool.len(),
                    pool.capacity()
                );
                for record in pool.iter() {
                    out.push_str(&format!("\t{}: {}\n", record.locator, record.line));
                }
                out.push_str("LRU\n");
                out
            }
        }
    }

    fn write_header(&mut self, number: usize, line: &str) -> Result<(), CliError> {
        writeln!(self.log, "{SEPARATOR}")?;
        writeln!(self.log, "Command {number}:\t{}", line.trim_end())?;
        writeln!(self.log)?;
        Ok(())
    }

    fn write_error(&mut self, err: &dyn std::fmt::Display) -> Result<(), CliError> {
        self.summary.failed += 1;
        writeln!(self.log, "\tError: {err}")?;
        Ok(())
    }

    fn write_report(&mut self, command: &Command, report: Report) -> Result<(), CliError> {
        match report {
            Report::World(world) => {
                writeln!(self.log, "World boundaries are set to:")?;
                writeln!(self.log, "\t\t{}", world.y_max)?;
                writeln!(self.log, "\t{}\t\t{}", world.x_min, world.x_max)?;
                writeln!(self.log, "\t\t{}", world.y_min)?;
            }
            Report::Imported(summary) => {
                writeln!(self.log, "Imported features by name: {}", summary.records)?;
                writeln!(self.log, "New name keys: {}", summary.new_names)?;
                writeln!(
                    self.log,
                    "Imported locations: {}",
                    summary.new_points + summary.merged_points
                )?;
                writeln!(self.log, "Rejected outside world: {}", summary.out_of_world)?;
                writeln!(self.log, "Missing coordinates: {}", summary.missing_coordinates)?;
                writeln!(self.log, "Malformed lines skipped: {}", summary.malformed)?;
                writeln!(
                    self.log,
                    "Longest hash chain: {}",
                    self.db.names().max_chain_len()
                )?;
            }
            Report::Records(records) => self.write_records(command, &records)?,
            Report::Dump(text) => self.log.write_all(text.as_bytes())?,
            Report::Quit => writeln!(self.log, "Terminating execution of commands.")?,
        }
        Ok(())
    }

    fn write_records(
        &mut self,
        command: &Command,
        records: &[ResolvedRecord],
    ) -> Result<(), CliError> {
        match command {
            Command::WhatIs { name, state } => {
                if records.is_empty() {
                    writeln!(self.log, "\tNo records match \"{name}\" and \"{state}\"")?;
                }
                for resolved in records {
                    let line = match GnisRecord::parse(&resolved.line) {
                        Ok(rec) => format!("{}  {}", rec.county, coordinates(&rec)),
                        Err(_) => resolved.line.clone(),
                    };
                    writeln!(self.log, "\t{}:  {line}", resolved.locator)?;
                }
            }
            Command::WhatIsAt(point) => {
                let at = describe_point(*point);
                if records.is_empty() {
                    writeln!(self.log, "\tNothing was found at {at}")?;
                } else {
                    writeln!(self.log, "\tThe following feature(s) were found at {at}:")?;
                }
                for resolved in records {
                    let line = match GnisRecord::parse(&resolved.line) {
                        Ok(rec) => format!("{}  {}  {}", rec.name, rec.county, rec.state),
                        Err(_) => resolved.line.clone(),
                    };
                    writeln!(self.log, "\t{}:  {line}", resolved.locator)?;
                }
            }
            Command::WhatIsIn {
                center,
                half_height,
                half_width,
            } => {
                let area = format!(
                    "({} +/- {half_width}, {} +/- {half_height})",
                    format_longitude(center.x),
                    format_latitude(center.y)
                );
                if records.is_empty() {
                    writeln!(self.log, "\tNothing was found in {area}")?;
                } else {
                    writeln!(
                        self.log,
                        "\tThe following {} feature(s) were found in {area}:",
                        records.len()
                    )?;
                }
                for resolved in records {
                    let line = match GnisRecord::parse(&resolved.line) {
                        Ok(rec) => format!("{}  {}  {}", rec.name, rec.state, coordinates(&rec)),
                        Err(_) => resolved.line.clone(),
                    };
                    writeln!(self.log, "\t{}:  {line}", resolved.locator)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn describe_point(point: GeoPoint) -> String {
    format!(
        "({}, {})",
        format_longitude(point.x),
        format_latitude(point.y)
    )
}

fn coordinates(record: &GnisRecord) -> String {
    match record.point() {
        Ok(point) => describe_point(point),
        Err(_) => format!("({}, {})", record.longitude, record.latitude),
    }
}
