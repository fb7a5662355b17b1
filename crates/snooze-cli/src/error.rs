//! CLI error types.

use std::fmt;

use snooze_filter::SnoozeError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// The snooze filter rejected the operation or its store failed.
    Filter(SnoozeError),
    /// Invalid configuration.
    Config(String),
    /// Output formatting error.
    Format(String),
    /// Invalid argument or input.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(e) => write!(f, "{e}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filter(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SnoozeError> for CliError {
    fn from(err: SnoozeError) -> Self {
        Self::Filter(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_filter_passes_through() {
        let err = CliError::from(SnoozeError::InvalidConfig {
            reason: "redis url is not set".into(),
        });
        assert_eq!(
            err.to_string(),
            "invalid configuration: redis url is not set"
        );
    }

    #[test]
    fn cli_error_display_invalid_argument() {
        let err = CliError::InvalidArgument("bad payload".into());
        assert_eq!(err.to_string(), "invalid argument: bad payload");
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
        assert!(std::error::Error::source(&cli_err).is_some());
    }
}
