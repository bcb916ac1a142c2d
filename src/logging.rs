//! Diagnostic logging setup.

use crate::types::{GisError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global diagnostic subscriber, writing to stderr so the
/// command log and stdout reports stay clean.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| GisError::InvalidArgument(format!("Invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| GisError::InvalidArgument("Logging already initialized".into()))
}
