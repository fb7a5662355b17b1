//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use snooze_filter::{ChannelSnoozes, Delivery};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Result of a snooze or wake.
#[derive(Debug, Clone, Serialize)]
pub struct SnoozeResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Storage key of the snooze.
    pub key: String,
    /// Response message.
    pub message: String,
}

impl TableDisplay for SnoozeResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let mark = if self.success { "✓" } else { "✗" };
        writeln!(writer, "{mark} {}", self.message)?;
        Ok(())
    }
}

/// Result of a snooze check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    /// Channel checked.
    pub channel: String,
    /// Rule reference checked.
    pub rule_url: String,
    /// Whether alerts are currently suppressed.
    pub snoozed: bool,
}

impl TableDisplay for CheckResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let state = if self.snoozed { "snoozed" } else { "not snoozed" };
        writeln!(writer, "{} in {}: {state}", self.rule_url, self.channel)?;
        Ok(())
    }
}

/// One snoozed rule for display.
#[derive(Debug, Clone, Serialize)]
pub struct SnoozeInfo {
    /// Storage key, usable with `wake`.
    pub key: String,
    /// Alert title.
    pub title: String,
    /// Rule reference.
    pub rule_url: String,
    /// Who snoozed it.
    pub snoozed_by: String,
    /// End of the snooze.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<DateTime<Utc>>,
    /// Whole minutes left.
    pub remaining_minutes: i64,
}

/// Snoozed rules of one channel.
#[derive(Debug, Clone, Serialize)]
pub struct SnoozeList {
    /// Channel listed.
    pub channel: String,
    /// Snoozes, ordered by key.
    pub snoozes: Vec<SnoozeInfo>,
}

impl SnoozeList {
    /// Builds the display list from filter output.
    #[must_use]
    pub fn from_snoozes(channel: &str, snoozes: ChannelSnoozes, now: DateTime<Utc>) -> Self {
        let mut snoozes: Vec<SnoozeInfo> = snoozes
            .into_iter()
            .map(|(key, record)| SnoozeInfo {
                key,
                snoozed_until: record.expires_at(),
                remaining_minutes: record.remaining(now).num_minutes(),
                title: record.title,
                rule_url: record.rule_url,
                snoozed_by: record.snoozed_by,
            })
            .collect();
        snoozes.sort_by(|a, b| a.key.cmp(&b.key));

        Self {
            channel: channel.to_string(),
            snoozes,
        }
    }
}

impl TableDisplay for SnoozeList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.snoozes.is_empty() {
            writeln!(writer, "No snoozed alerts in {}", self.channel)?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<32}  {:<40}  {:<12}  {:>8}",
            "TITLE", "RULE", "SNOOZED BY", "MIN LEFT"
        )?;
        writeln!(writer, "{}", "─".repeat(98))?;

        for snooze in &self.snoozes {
            writeln!(
                writer,
                "{:<32}  {:<40}  {:<12}  {:>8}",
                truncate(&snooze.title, 32),
                truncate(&snooze.rule_url, 40),
                truncate(&snooze.snoozed_by, 12),
                snooze.remaining_minutes
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} snoozed alert(s)", self.snoozes.len())?;
        Ok(())
    }
}

/// Decision for an ingested alert.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct DeliveryResponse(pub Delivery);

impl TableDisplay for DeliveryResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match &self.0 {
            Delivery::Forward(notice) => {
                writeln!(writer, "forward: {} ({})", notice.title, notice.state)?;
                writeln!(writer, "  rule:    {}", notice.rule_url)?;
                writeln!(writer, "  channel: {}", notice.channel)?;
                if !notice.snooze_options.is_empty() {
                    let options: Vec<String> =
                        notice.snooze_options.iter().map(ToString::to_string).collect();
                    writeln!(writer, "  snooze:  {}", options.join(", "))?;
                }
            }
            Delivery::Suppressed { key } => {
                writeln!(writer, "suppressed: {key} is snoozed")?;
            }
        }
        Ok(())
    }
}

/// Shortens `s` to at most `max_len` characters, marking the cut with `...`.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
