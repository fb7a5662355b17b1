//! # snooze-cli
//!
//! Command-line front end for `snooze-filter`.
//!
//! Provides commands for:
//! - Snoozing and waking a rule in a channel
//! - Checking whether a rule is snoozed
//! - Listing the snoozes of a channel
//! - Deciding whether a Grafana webhook payload would be posted

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::{BackendArg, Cli, Commands, Format, LogFormat, SnoozeArgs};
pub use error::CliError;
pub use output::OutputFormat;
