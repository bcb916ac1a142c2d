//! Optional TOML config file for the `geodex` binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::db::GisOptions;

/// Settings loaded from the optional `config.toml`.
#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    /// Loads `explicit`, or the default location when `None`. A missing file
    /// yields the built-in defaults.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        let config = Self { path, data };
        config.options()?;
        Ok(config)
    }

    /// Parses config text that did not come from a file.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let data = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        let config = Self { path: None, data };
        config.options()?;
        Ok(config)
    }

    /// File the config was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `[log] level` filter, if set.
    pub fn log_level(&self) -> Option<&str> {
        self.data.log.level.as_deref()
    }

    /// Index sizing with file values layered over the defaults.
    pub fn options(&self) -> Result<GisOptions, ConfigError> {
        let mut options = GisOptions::default();
        self.data.index.apply(&mut options);
        options.validate().map_err(|err| ConfigError::Invalid {
            path: self.display_path(),
            message: err.to_string(),
        })?;
        Ok(options)
    }

    fn display_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from("<inline>"))
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    index: IndexSection,
    #[serde(default)]
    log: LogSection,
}

/// Overrides for [`GisOptions`]; absent keys keep their defaults.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSection {
    /// Initial name index slot count.
    pub hash_slots: Option<usize>,
    /// Load factor that triggers a rehash.
    pub load_limit: Option<f64>,
    /// Quadtree leaf capacity.
    pub bucket_capacity: Option<usize>,
    /// Buffer pool capacity in records.
    pub pool_capacity: Option<usize>,
}

impl IndexSection {
    /// Copies every present key onto `options`.
    pub fn apply(&self, options: &mut GisOptions) {
        if let Some(slots) = self.hash_slots {
            options.hash_slots = slots;
        }
        if let Some(limit) = self.load_limit {
            options.load_limit = limit;
        }
        if let Some(capacity) = self.bucket_capacity {
            options.bucket_capacity = capacity;
        }
        if let Some(capacity) = self.pool_capacity {
            options.pool_capacity = capacity;
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct LogSection {
    level: Option<String>,
}

/// Errors raised while loading the CLI config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this layout.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },
    /// The `[index]` values fail validation.
    #[error("invalid [index] settings in {path}: {message}")]
    Invalid {
        /// Config file path.
        path: PathBuf,
        /// Validation failure.
        message: String,
    },
}

/// `<config dir>/geodex/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("geodex").join("config.toml"))
}
