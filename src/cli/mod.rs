#![forbid(unsafe_code)]

//! Batch front end: command scripts, the command log, GNIS import and the
//! optional configuration file.

pub mod config;
pub mod import;
pub mod runner;
pub mod script;

use thiserror::Error;

use crate::types::GisError;

/// Error type for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from script, log or import files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Import file reading error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Index or record store error.
    #[error(transparent)]
    Gis(#[from] GisError),
    /// Configuration file error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}
