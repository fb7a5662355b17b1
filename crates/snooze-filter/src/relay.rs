//! Typed boundary between inbound alerts, chat controls and the filter.
//!
//! Alert ingestion hands a [`GrafanaAlert`] to [`AlertRelay::ingest`] and
//! gets back a [`Delivery`] telling it whether to post. The interaction path
//! turns a pressed snooze control into a [`SnoozeAction`] and passes it to
//! [`AlertRelay::apply`]. Message rendering stays with the caller.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SnoozeError};
use crate::filter::AlertFilter;

/// Prefix of the block id that carries the rule reference of a posted alert.
pub const TITLE_BLOCK_PREFIX: &str = "title|";

/// State reported by a Grafana alert webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrafanaAlertState {
    /// The rule recovered.
    Ok,
    /// The rule is paused.
    Paused,
    /// The query returned no data.
    NoData,
    /// The condition holds but has not lasted long enough.
    Pending,
    /// The rule is firing.
    Alerting,
}

impl GrafanaAlertState {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Paused => "paused",
            Self::NoData => "no_data",
            Self::Pending => "pending",
            Self::Alerting => "alerting",
        }
    }
}

impl fmt::Display for GrafanaAlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metric that matched the alert condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMatch {
    /// Metric name.
    pub metric: String,
    /// Observed value.
    pub value: f64,
    /// Series tags.
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

/// Body of a Grafana alert webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaAlert {
    /// Alert title.
    pub title: String,
    /// Free-form message configured on the rule.
    #[serde(default)]
    pub message: Option<String>,
    /// Current rule state.
    pub state: GrafanaAlertState,
    /// Rule name.
    pub rule_name: String,
    /// Link to the rule, used as the rule reference.
    pub rule_url: String,
    /// Metrics that matched.
    #[serde(default)]
    pub eval_matches: Vec<EvalMatch>,
}

/// A snooze choice offered under each posted alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnoozeOption {
    /// Cancel the current snooze.
    Wake,
    /// Snooze for a number of minutes.
    For {
        /// Snooze length.
        minutes: i64,
    },
}

impl SnoozeOption {
    /// Parses the value attached to a snooze control.
    ///
    /// `"wake"` and `"0"` both mean wake.
    ///
    /// # Errors
    ///
    /// Returns `SnoozeError::InvalidArgument` for anything that is not
    /// `"wake"` or a non-negative integer.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("wake") {
            return Ok(Self::Wake);
        }

        match value.parse::<i64>() {
            Ok(0) => Ok(Self::Wake),
            Ok(minutes) if minutes > 0 => Ok(Self::For { minutes }),
            _ => Err(SnoozeError::InvalidArgument {
                reason: format!("invalid snooze option '{value}'"),
            }),
        }
    }

    /// Returns the duration in minutes, zero for [`SnoozeOption::Wake`].
    #[must_use]
    pub const fn minutes(&self) -> i64 {
        match self {
            Self::Wake => 0,
            Self::For { minutes } => *minutes,
        }
    }
}

impl fmt::Display for SnoozeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wake => f.write_str("wake"),
            Self::For { minutes } => write!(f, "{minutes}"),
        }
    }
}

/// The snooze menu offered under each alert, as `(label, option)` pairs.
#[must_use]
pub fn snooze_options() -> Vec<(&'static str, SnoozeOption)> {
    [
        ("wake", 0),
        ("15 min", 15),
        ("30 min", 30),
        ("1 hour", 60),
        ("2 hours", 120),
        ("5 hours", 300),
        ("1 day", 1440),
    ]
    .into_iter()
    .map(|(label, minutes)| {
        let option = if minutes == 0 {
            SnoozeOption::Wake
        } else {
            SnoozeOption::For { minutes }
        };
        (label, option)
    })
    .collect()
}

/// Recovers the rule reference from a posted alert's title block id.
///
/// # Errors
///
/// Returns `SnoozeError::KeyExtractionFailed` if the id does not carry a
/// rule reference.
pub fn rule_url_from_block_id(block_id: &str) -> Result<&str> {
    block_id
        .strip_prefix(TITLE_BLOCK_PREFIX)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| SnoozeError::KeyExtractionFailed {
            reason: format!("block '{block_id}' does not carry a rule url"),
        })
}

/// A pressed snooze control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnoozeAction {
    /// Channel the alert was posted to.
    pub channel: String,
    /// Alert title.
    pub title: String,
    /// Rule reference of the alert.
    pub rule_url: String,
    /// Who pressed the control.
    pub actor: String,
    /// Selected option.
    pub option: SnoozeOption,
}

impl SnoozeAction {
    /// Creates an action.
    ///
    /// # Errors
    ///
    /// Returns `SnoozeError::KeyExtractionFailed` if `rule_url` is empty.
    pub fn new(
        channel: impl Into<String>,
        title: impl Into<String>,
        rule_url: impl Into<String>,
        actor: impl Into<String>,
        option: SnoozeOption,
    ) -> Result<Self> {
        let rule_url = rule_url.into();
        if rule_url.trim().is_empty() {
            return Err(SnoozeError::KeyExtractionFailed {
                reason: "snooze action has no rule url".to_string(),
            });
        }

        Ok(Self {
            channel: channel.into(),
            title: title.into(),
            rule_url,
            actor: actor.into(),
            option,
        })
    }
}

/// An alert that should be posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotice {
    /// Destination channel.
    pub channel: String,
    /// Alert title.
    pub title: String,
    /// Rule reference.
    pub rule_url: String,
    /// Rule state.
    pub state: GrafanaAlertState,
    /// Rule message, if any.
    pub message: Option<String>,
    /// Metrics that matched.
    pub eval_matches: Vec<EvalMatch>,
    /// Snooze choices to attach, empty for recovered alerts.
    pub snooze_options: Vec<SnoozeOption>,
}

impl AlertNotice {
    fn from_alert(channel: &str, alert: &GrafanaAlert) -> Self {
        let snooze_options = if alert.state == GrafanaAlertState::Ok {
            Vec::new()
        } else {
            snooze_options().into_iter().map(|(_, o)| o).collect()
        };

        Self {
            channel: channel.to_string(),
            title: alert.title.clone(),
            rule_url: alert.rule_url.clone(),
            state: alert.state,
            message: alert.message.clone(),
            eval_matches: alert.eval_matches.clone(),
            snooze_options,
        }
    }

    /// Returns the block id a chat message should carry so the rule can be
    /// recovered from a later interaction.
    #[must_use]
    pub fn title_block_id(&self) -> String {
        format!("{TITLE_BLOCK_PREFIX}{}", self.rule_url)
    }
}

/// What to do with an inbound alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "delivery", rename_all = "snake_case")]
pub enum Delivery {
    /// Post the alert.
    Forward(AlertNotice),
    /// Drop the alert, its rule is snoozed in this channel.
    Suppressed {
        /// Storage key of the active snooze.
        key: String,
    },
}

impl Delivery {
    /// Returns `true` if the alert was suppressed.
    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed { .. })
    }
}

/// Connects the inbound paths to an [`AlertFilter`].
#[derive(Debug, Clone)]
pub struct AlertRelay {
    filter: AlertFilter,
}

impl AlertRelay {
    /// Creates a relay over `filter`.
    #[must_use]
    pub const fn new(filter: AlertFilter) -> Self {
        Self { filter }
    }

    /// Returns the underlying filter.
    #[must_use]
    pub const fn filter(&self) -> &AlertFilter {
        &self.filter
    }

    /// Decides whether `alert` should be posted to `channel`.
    ///
    /// # Errors
    ///
    /// Returns `SnoozeError::KeyExtractionFailed` if the alert has no rule
    /// url and propagates store errors unchanged.
    pub async fn ingest(&self, channel: &str, alert: &GrafanaAlert) -> Result<Delivery> {
        if alert.rule_url.trim().is_empty() {
            return Err(SnoozeError::KeyExtractionFailed {
                reason: format!("alert '{}' has no rule url", alert.title),
            });
        }

        if self.filter.is_snoozed(channel, &alert.rule_url).await? {
            let key = AlertFilter::key(channel, &alert.rule_url);
            debug!(key = %key, state = %alert.state, "suppressed snoozed alert");
            return Ok(Delivery::Suppressed { key });
        }

        info!(
            channel = %channel,
            rule = %alert.rule_name,
            state = %alert.state,
            "forwarding alert"
        );
        Ok(Delivery::Forward(AlertNotice::from_alert(channel, alert)))
    }

    /// Applies a pressed snooze control.
    ///
    /// # Errors
    ///
    /// Propagates filter errors unchanged.
    pub async fn apply(&self, action: &SnoozeAction) -> Result<()> {
        match action.option {
            SnoozeOption::Wake => {
                let key = AlertFilter::key(&action.channel, &action.rule_url);
                self.filter.wake(&key).await
            }
            SnoozeOption::For { minutes } => {
                self.filter
                    .snooze(
                        &action.channel,
                        &action.title,
                        &action.rule_url,
                        &action.actor,
                        minutes,
                    )
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use test_case::test_case;

    use crate::clock::ManualClock;
    use crate::memory::InMemoryStore;

    fn relay() -> (AlertRelay, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2023, 7, 11, 0, 0, 0).unwrap(),
        ));
        let filter = AlertFilter::with_clock(Arc::new(InMemoryStore::new()), clock.clone());
        (AlertRelay::new(filter), clock)
    }

    fn alert(state: GrafanaAlertState) -> GrafanaAlert {
        GrafanaAlert {
            title: "[Alerting] Disk full".to_string(),
            message: Some("Disk usage above 95%".to_string()),
            state,
            rule_name: "Disk full".to_string(),
            rule_url: "https://rules/42".to_string(),
            eval_matches: vec![EvalMatch {
                metric: "disk_used".to_string(),
                value: 97.5,
                tags: None,
            }],
        }
    }

    #[test]
    fn grafana_payload_deserializes() {
        let raw = r#"{
            "title": "[Alerting] Disk full",
            "message": null,
            "state": "alerting",
            "ruleName": "Disk full",
            "ruleUrl": "https://rules/42",
            "evalMatches": [{"metric": "disk_used", "value": 97, "tags": {"host": "db1"}}],
            "imageUrl": "https://img/1.png"
        }"#;
        let alert: GrafanaAlert = serde_json::from_str(raw).unwrap();

        assert_eq!(alert.state, GrafanaAlertState::Alerting);
        assert_eq!(alert.rule_url, "https://rules/42");
        assert_eq!(alert.eval_matches.len(), 1);
        assert!(alert.message.is_none());
    }

    #[test]
    fn grafana_state_no_data_deserializes() {
        let state: GrafanaAlertState = serde_json::from_str("\"no_data\"").unwrap();
        assert_eq!(state, GrafanaAlertState::NoData);
        assert_eq!(state.to_string(), "no_data");
    }

    #[test_case("wake", SnoozeOption::Wake ; "wake")]
    #[test_case("WAKE", SnoozeOption::Wake ; "wake upper case")]
    #[test_case("0", SnoozeOption::Wake ; "zero")]
    #[test_case("15", SnoozeOption::For { minutes: 15 } ; "minutes")]
    #[test_case(" 1440 ", SnoozeOption::For { minutes: 1440 } ; "padded")]
    fn snooze_option_parse(raw: &str, expected: SnoozeOption) {
        assert_eq!(SnoozeOption::parse(raw).unwrap(), expected);
    }

    #[test_case("-5" ; "negative")]
    #[test_case("soon" ; "word")]
    #[test_case("" ; "empty")]
    fn snooze_option_parse_rejects(raw: &str) {
        assert!(matches!(
            SnoozeOption::parse(raw),
            Err(SnoozeError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn snooze_menu_starts_with_wake() {
        let options = snooze_options();
        assert_eq!(options.len(), 7);
        assert_eq!(options[0], ("wake", SnoozeOption::Wake));
        assert_eq!(options[6], ("1 day", SnoozeOption::For { minutes: 1440 }));
    }

    #[test]
    fn rule_url_from_title_block() {
        assert_eq!(
            rule_url_from_block_id("title|https://rules/42").unwrap(),
            "https://rules/42"
        );
        assert!(rule_url_from_block_id("title|").is_err());
        assert!(matches!(
            rule_url_from_block_id("alert-status"),
            Err(SnoozeError::KeyExtractionFailed { .. })
        ));
    }

    #[test]
    fn action_requires_rule_url() {
        let err = SnoozeAction::new("alerts", "title", " ", "alice", SnoozeOption::Wake).unwrap_err();
        assert!(matches!(err, SnoozeError::KeyExtractionFailed { .. }));
    }

    #[tokio::test]
    async fn ingest_forwards_unsnoozed_alert() {
        let (relay, _clock) = relay();

        let delivery = relay.ingest("alerts", &alert(GrafanaAlertState::Alerting)).await.unwrap();

        let notice = match delivery {
            Delivery::Forward(notice) => notice,
            other => panic!("expected forward, got {other:?}"),
        };
        assert_eq!(notice.channel, "alerts");
        assert_eq!(notice.snooze_options.len(), 7);
        assert_eq!(notice.title_block_id(), "title|https://rules/42");
    }

    #[tokio::test]
    async fn ingest_recovered_alert_has_no_menu() {
        let (relay, _clock) = relay();

        let delivery = relay.ingest("alerts", &alert(GrafanaAlertState::Ok)).await.unwrap();

        let notice = match delivery {
            Delivery::Forward(notice) => notice,
            other => panic!("expected forward, got {other:?}"),
        };
        assert!(notice.snooze_options.is_empty());
    }

    #[tokio::test]
    async fn ingest_rejects_alert_without_rule_url() {
        let (relay, _clock) = relay();
        let mut alert = alert(GrafanaAlertState::Alerting);
        alert.rule_url = String::new();

        let err = relay.ingest("alerts", &alert).await.unwrap_err();
        assert!(matches!(err, SnoozeError::KeyExtractionFailed { .. }));
    }

    #[tokio::test]
    async fn apply_snooze_then_wake() {
        let (relay, clock) = relay();
        let snooze = SnoozeAction::new(
            "alerts",
            "[Alerting] Disk full",
            "https://rules/42",
            "alice",
            SnoozeOption::For { minutes: 15 },
        )
        .unwrap();

        relay.apply(&snooze).await.unwrap();
        let delivery = relay.ingest("alerts", &alert(GrafanaAlertState::Alerting)).await.unwrap();
        assert_eq!(
            delivery,
            Delivery::Suppressed {
                key: "alerts;https://rules/42".to_string()
            }
        );

        // Other channels still receive the alert.
        let elsewhere = relay.ingest("ops", &alert(GrafanaAlertState::Alerting)).await.unwrap();
        assert!(!elsewhere.is_suppressed());

        let wake = SnoozeAction { option: SnoozeOption::Wake, ..snooze };
        relay.apply(&wake).await.unwrap();
        let delivery = relay.ingest("alerts", &alert(GrafanaAlertState::Alerting)).await.unwrap();
        assert!(!delivery.is_suppressed());

        clock.advance(Duration::minutes(1));
        assert!(relay.filter().list_by_channel("alerts").await.unwrap().is_empty());
    }
}
