//! End-to-end tests for the `alert-snooze` binary.
//!
//! Each invocation is a fresh process, so state never carries over between
//! commands on the in-memory backend.

use assert_cmd::Command;
use predicates::prelude::*;

const ALERT: &str = r#"{
    "title": "[Alerting] Disk full",
    "state": "alerting",
    "ruleName": "Disk full",
    "ruleUrl": "https://rules/42",
    "evalMatches": [{"metric": "disk", "value": 99.0}]
}"#;

fn alert_snooze() -> Command {
    let mut cmd = Command::cargo_bin("alert-snooze").unwrap();
    cmd.env_remove("FILTER_BACKEND")
        .env_remove("REDIS_URL")
        .env_remove("LOG_FORMAT")
        .env_remove("RUST_LOG")
        .env("LOG_LEVEL", "warn");
    cmd
}

#[test]
fn check_reports_not_snoozed() {
    alert_snooze()
        .args(["check", "-c", "alerts", "-r", "https://rules/42"])
        .assert()
        .success()
        .stdout("https://rules/42 in alerts: not snoozed\n");
}

#[test]
fn check_json_output() {
    alert_snooze()
        .args(["--format", "json", "check", "-c", "alerts", "-r", "rule1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"snoozed\": false"));
}

#[test]
fn snooze_refuses_in_memory_backend() {
    alert_snooze()
        .args([
            "snooze", "-c", "alerts", "-r", "https://rules/42", "-t", "Disk full", "--by",
            "alice", "-m", "15",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "'snooze' does not persist with the in-memory backend",
        ));
}

#[test]
fn snooze_rejects_negative_minutes() {
    alert_snooze()
        .args(["snooze", "-c", "alerts", "-r", "rule1", "--by", "alice", "-m", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid snooze option"));
}

#[test]
fn list_empty_channel() {
    alert_snooze()
        .args(["list", "-c", "alerts"])
        .assert()
        .success()
        .stdout("No snoozed alerts in alerts\n");
}

#[test]
fn wake_refuses_in_memory_backend() {
    alert_snooze()
        .args(["wake", "-c", "alerts", "-r", "rule1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'wake' does not persist with the in-memory backend",
        ));
}

#[test]
fn ingest_from_stdin_forwards() {
    alert_snooze()
        .args(["ingest", "-c", "alerts"])
        .write_stdin(ALERT)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("forward: [Alerting] Disk full (alerting)"))
        .stdout(predicate::str::contains("snooze:  wake, 15, 30, 60, 120, 300, 1440"));
}

#[test]
fn ingest_rejects_garbage() {
    alert_snooze()
        .args(["ingest", "-c", "alerts"])
        .write_stdin("definitely not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid alert payload"));
}

#[test]
fn redis_backend_requires_url() {
    alert_snooze()
        .args(["--backend", "redis", "list", "-c", "alerts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("redis url is not set"));
}

#[test]
#[ignore = "requires a running redis server"]
fn snooze_persists_across_invocations_on_redis() {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    let channel = format!("cli-test-{}", std::process::id());
    let redis = |args: &[&str]| {
        let mut cmd = alert_snooze();
        cmd.args(["--backend", "redis", "--redis-url", url.as_str()]).args(args);
        cmd
    };

    redis(&["snooze", "-c", channel.as_str(), "-r", "rule1", "--by", "alice", "-m", "15"])
        .assert()
        .success();
    redis(&["check", "-c", channel.as_str(), "-r", "rule1"])
        .assert()
        .success()
        .stdout(format!("rule1 in {channel}: snoozed\n"));
    redis(&["list", "-c", channel.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1 snoozed alert(s)"));

    redis(&["wake", "-c", channel.as_str(), "-r", "rule1"]).assert().success();
    redis(&["check", "-c", channel.as_str(), "-r", "rule1"])
        .assert()
        .success()
        .stdout(format!("rule1 in {channel}: not snoozed\n"));
}
