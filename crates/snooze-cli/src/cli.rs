//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use snooze_filter::{FilterBackend, SnoozeOption};

use crate::error::CliError;

/// Snooze, wake and inspect alert snoozes.
#[derive(Parser, Debug, Clone)]
#[command(name = "alert-snooze")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Store holding the snoozes.
    #[arg(short, long, value_enum, env = "FILTER_BACKEND", default_value_t = BackendArg::InMemory)]
    pub backend: BackendArg,

    /// Redis connection URL, required for the redis backend.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Reaper sweep interval for the in-memory backend, in seconds.
    #[arg(long, default_value_t = 120)]
    pub reaper_interval_secs: u64,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log level or filter directive.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log line format.
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Simple)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Rejects flag combinations that parse but cannot do what they say.
    ///
    /// Each invocation is its own process, so a snooze written to the
    /// in-memory backend is gone once the command exits.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if a state-changing command targets the
    /// in-memory backend.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.backend == BackendArg::InMemory && self.command.changes_state() {
            return Err(CliError::Config(format!(
                "'{}' does not persist with the in-memory backend, use --backend redis",
                self.command.name()
            )));
        }
        Ok(())
    }
}

/// Backend choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Process-local map, lost on exit.
    #[value(alias = "in_memory")]
    InMemory,
    /// Redis with native expiry.
    Redis,
}

impl From<BackendArg> for FilterBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::InMemory => Self::InMemory,
            BackendArg::Redis => Self::Redis,
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Log line format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    /// Plain text lines.
    #[default]
    Simple,
    /// One JSON object per line.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Snooze a rule in a channel.
    Snooze(SnoozeArgs),

    /// Wake a snoozed rule.
    Wake {
        /// Channel the rule is snoozed in.
        #[arg(short, long)]
        channel: String,

        /// Rule reference.
        #[arg(short, long)]
        rule: String,
    },

    /// Check whether a rule is snoozed.
    Check {
        /// Channel to check.
        #[arg(short, long)]
        channel: String,

        /// Rule reference.
        #[arg(short, long)]
        rule: String,
    },

    /// List the snoozed rules of a channel.
    List {
        /// Channel to list.
        #[arg(short, long)]
        channel: String,
    },

    /// Decide whether a Grafana webhook payload would be posted.
    ///
    /// Reads the payload from `--file`, or from stdin when omitted.
    Ingest {
        /// Destination channel.
        #[arg(short, long)]
        channel: String,

        /// File holding the webhook JSON.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

impl Commands {
    /// Returns the subcommand name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Snooze(_) => "snooze",
            Self::Wake { .. } => "wake",
            Self::Check { .. } => "check",
            Self::List { .. } => "list",
            Self::Ingest { .. } => "ingest",
        }
    }

    /// Returns `true` for commands that write to the store.
    #[must_use]
    pub const fn changes_state(&self) -> bool {
        matches!(self, Self::Snooze(_) | Self::Wake { .. })
    }
}

/// Arguments for the snooze command.
#[derive(Parser, Debug, Clone)]
pub struct SnoozeArgs {
    /// Channel to snooze the rule in.
    #[arg(short, long)]
    pub channel: String,

    /// Rule reference, usually the rule URL.
    #[arg(short, long)]
    pub rule: String,

    /// Alert title shown in listings.
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Who is snoozing.
    #[arg(long, env = "USER", default_value = "cli")]
    pub by: String,

    /// Minutes to snooze for, or `wake`.
    #[arg(short, long, value_parser = parse_snooze_option, allow_negative_numbers = true)]
    pub minutes: SnoozeOption,
}

fn parse_snooze_option(raw: &str) -> Result<SnoozeOption, String> {
    SnoozeOption::parse(raw).map_err(|e| e.to_string())
}
