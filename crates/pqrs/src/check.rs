// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pqrs check` command implementation.
//!
//! Confirms the backend settings, signs the service account in and out
//! again, and reports which optional integrations are configured.

use std::time::{Duration, Instant};

use colored::Colorize;
use pqrs_config::PqrsConfig;
use pqrs_core::PqrsError;
use pqrs_filemaker::DataApiClient;
use pqrs_notify::NotificationDispatcher;
use serde::Serialize;

use crate::render::Output;

/// Status of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name,
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

/// Run every check and print the results. Fails when any check fails.
pub async fn run_check(config: &PqrsConfig, out: &Output) -> Result<(), PqrsError> {
    let results = vec![
        check_session(config).await,
        check_assignment(config),
        check_webhook(config),
    ];

    if out.is_json() {
        out.print_json(&results);
    } else {
        print_results(&results, out.color());
    }

    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    if failed > 0 {
        return Err(PqrsError::Config(format!("{failed} check(s) failed")));
    }
    Ok(())
}

fn print_results(results: &[CheckResult], color: bool) {
    println!();
    println!("  pqrs check");
    println!("  {}", "-".repeat(50));
    for result in results {
        let duration_ms = result.duration.as_millis();
        let symbol = match (result.status, color) {
            (CheckStatus::Pass, true) => "✓".green().to_string(),
            (CheckStatus::Warn, true) => "!".yellow().to_string(),
            (CheckStatus::Fail, true) => "✗".red().to_string(),
            (CheckStatus::Pass, false) => "[OK]  ".to_string(),
            (CheckStatus::Warn, false) => "[WARN]".to_string(),
            (CheckStatus::Fail, false) => "[FAIL]".to_string(),
        };
        println!(
            "    {symbol} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        );
    }
    println!();
}

/// Exchanges the service account credentials and logs the session out.
async fn check_session(config: &PqrsConfig) -> CheckResult {
    const NAME: &str = "FileMaker session";
    let start = Instant::now();

    let client = match DataApiClient::from_config(&config.filemaker) {
        Ok(client) => client,
        Err(e) => return CheckResult::new(NAME, CheckStatus::Fail, e.to_string(), start),
    };
    match client.session().acquire().await {
        Ok(_) => {
            client.session().end_session().await;
            let user = client.session().username().unwrap_or_default();
            CheckResult::new(NAME, CheckStatus::Pass, format!("signed in as {user}"), start)
        }
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string(), start),
    }
}

fn check_assignment(config: &PqrsConfig) -> CheckResult {
    const NAME: &str = "Assignment script";
    let start = Instant::now();
    match config
        .automation
        .assignment_script
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        Some(script) => CheckResult::new(NAME, CheckStatus::Pass, script.to_string(), start),
        None => CheckResult::new(
            NAME,
            CheckStatus::Warn,
            "not configured, new cases stay unassigned",
            start,
        ),
    }
}

fn check_webhook(config: &PqrsConfig) -> CheckResult {
    const NAME: &str = "Notification webhook";
    let start = Instant::now();
    match NotificationDispatcher::from_config(&config.webhook) {
        Ok(dispatcher) if dispatcher.is_enabled() => {
            CheckResult::new(NAME, CheckStatus::Pass, "configured", start)
        }
        Ok(_) => CheckResult::new(
            NAME,
            CheckStatus::Warn,
            "url or api key missing, notifications disabled",
            start,
        ),
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string(), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqrs_test_utils::data_api::{self, DB_PATH};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn session_check_signs_in_and_out() {
        let server = MockServer::start().await;
        data_api::mount_session(&server, "tok").await;
        Mock::given(method("DELETE"))
            .and(path(format!("{DB_PATH}/sessions/tok")))
            .respond_with(ResponseTemplate::new(200).set_body_json(data_api::ok(serde_json::json!({}))))
            .expect(1)
            .mount(&server)
            .await;

        let result = check_session(&data_api::pqrs_config(&server.uri())).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.message, "signed in as svc");
    }

    #[tokio::test]
    async fn session_check_fails_without_base_url() {
        let result = check_session(&PqrsConfig::default()).await;
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains("filemaker.base_url"));
    }

    #[test]
    fn optional_integrations_only_warn() {
        let config = PqrsConfig::default();
        assert_eq!(check_assignment(&config).status, CheckStatus::Warn);
        assert_eq!(check_webhook(&config).status, CheckStatus::Warn);
    }
}
