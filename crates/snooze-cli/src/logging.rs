//! Tracing subscriber setup.

use std::io;

use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;
use crate::error::CliError;

/// Builds the event filter.
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the directive.
///
/// # Errors
///
/// Returns `CliError::Config` if `level` is not a valid directive.
pub fn env_filter(level: &str) -> Result<EnvFilter, CliError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| CliError::Config(format!("invalid log level '{level}': {e}")))
}

/// Installs the global subscriber writing to stderr.
///
/// A subscriber installed earlier stays in place.
///
/// # Errors
///
/// Returns `CliError::Config` if `level` is not a valid directive.
pub fn init(level: &str, format: LogFormat) -> Result<(), CliError> {
    let filter = env_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    // Ignore the error: it only means a subscriber is already set.
    let _ = match format {
        LogFormat::Simple => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    Ok(())
}
