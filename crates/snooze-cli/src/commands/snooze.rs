//! Snooze command implementation.
//!
//! Handles snoozing, waking, checking, listing and ingesting alerts.

use std::io::{Read, Write};
use std::path::Path;

use chrono::Utc;
use snooze_filter::{AlertFilter, AlertRelay, GrafanaAlert, SnoozeOption};
use tracing::debug;

use crate::cli::{Commands, SnoozeArgs};
use crate::error::CliError;
use crate::output::{CheckResponse, DeliveryResponse, OutputFormat, SnoozeList, SnoozeResponse};

/// Handler for the snooze subcommands.
pub struct SnoozeCommand<'a> {
    filter: &'a AlertFilter,
}

impl<'a> SnoozeCommand<'a> {
    /// Creates a new handler over `filter`.
    #[must_use]
    pub const fn new(filter: &'a AlertFilter) -> Self {
        Self { filter }
    }

    /// Executes `command`.
    ///
    /// # Errors
    ///
    /// Returns error if the filter rejects the command or output fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &Commands,
    ) -> Result<(), CliError> {
        match command {
            Commands::Snooze(args) => self.snooze(out, format, args).await,
            Commands::Wake { channel, rule } => self.wake(out, format, channel, rule).await,
            Commands::Check { channel, rule } => self.check(out, format, channel, rule).await,
            Commands::List { channel } => self.list(out, format, channel).await,
            Commands::Ingest { channel, file } => {
                let payload = read_payload(file.as_deref())?;
                self.ingest(out, format, channel, &payload).await
            }
        }
    }

    async fn snooze<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &SnoozeArgs,
    ) -> Result<(), CliError> {
        let key = AlertFilter::key(&args.channel, &args.rule);
        let message = match args.minutes {
            SnoozeOption::Wake => {
                self.filter.wake(&key).await?;
                format!("Woke {} in {}", args.rule, args.channel)
            }
            SnoozeOption::For { minutes } => {
                self.filter
                    .snooze(&args.channel, &args.title, &args.rule, &args.by, minutes)
                    .await?;
                format!(
                    "Snoozed {} in {} for {minutes} minute(s)",
                    args.rule, args.channel
                )
            }
        };

        let response = SnoozeResponse {
            success: true,
            key,
            message,
        };
        format.write(out, &response)
    }

    async fn wake<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        channel: &str,
        rule: &str,
    ) -> Result<(), CliError> {
        let key = AlertFilter::key(channel, rule);
        self.filter.wake(&key).await?;

        let response = SnoozeResponse {
            success: true,
            key,
            message: format!("Woke {rule} in {channel}"),
        };
        format.write(out, &response)
    }

    async fn check<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        channel: &str,
        rule: &str,
    ) -> Result<(), CliError> {
        let snoozed = self.filter.is_snoozed(channel, rule).await?;
        let response = CheckResponse {
            channel: channel.to_string(),
            rule_url: rule.to_string(),
            snoozed,
        };
        format.write(out, &response)
    }

    async fn list<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        channel: &str,
    ) -> Result<(), CliError> {
        let snoozes = self.filter.list_by_channel(channel).await?;
        let list = SnoozeList::from_snoozes(channel, snoozes, Utc::now());
        format.write(out, &list)
    }

    async fn ingest<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        channel: &str,
        payload: &str,
    ) -> Result<(), CliError> {
        let alert: GrafanaAlert = serde_json::from_str(payload)
            .map_err(|e| CliError::InvalidArgument(format!("invalid alert payload: {e}")))?;
        debug!(channel = %channel, rule = %alert.rule_url, "ingesting alert");

        let relay = AlertRelay::new(self.filter.clone());
        let delivery = relay.ingest(channel, &alert).await?;
        format.write(out, &DeliveryResponse(delivery))
    }
}

fn read_payload(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut payload = String::new();
            std::io::stdin().read_to_string(&mut payload)?;
            Ok(payload)
        }
    }
}
