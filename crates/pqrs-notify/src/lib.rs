// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email notifications through an external webhook.
//!
//! [`NotificationDispatcher::notify`] never fails: a missing configuration,
//! a transport error, or a rejected request all come back as a
//! [`NotifyOutcome`] with `success == false`.

use std::time::Duration;

use pqrs_config::model::WebhookConfig;
use pqrs_core::PqrsError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Who to notify about which case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseNotice {
    pub name: String,
    pub email: String,
    /// Case identifier shown to the requester.
    pub radicado: String,
    pub comment: Option<String>,
    /// True for follow-ups on an existing case, false for the creation receipt.
    pub updated: bool,
}

impl CaseNotice {
    /// Creation receipt for a new case.
    pub fn created(
        name: impl Into<String>,
        email: impl Into<String>,
        radicado: impl ToString,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            radicado: radicado.to_string(),
            comment: None,
            updated: false,
        }
    }

    /// Follow-up on an existing case, optionally quoting an employee comment.
    pub fn update(
        name: impl Into<String>,
        email: impl Into<String>,
        radicado: impl ToString,
        comment: Option<String>,
    ) -> Self {
        Self {
            comment: comment.filter(|c| !c.trim().is_empty()),
            updated: true,
            ..Self::created(name, email, radicado)
        }
    }
}

/// Result of one notification attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotifyOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Webhook response body, when it was JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl NotifyOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    name: &'a str,
    email: &'a str,
    radicado: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comentario: Option<&'a str>,
    updated: bool,
    url: &'a str,
}

/// Posts case notices to the configured webhook.
pub struct NotificationDispatcher {
    http: reqwest::Client,
    url: Option<String>,
    api_key: Option<SecretString>,
    site_url: String,
}

impl NotificationDispatcher {
    pub fn from_config(config: &WebhookConfig) -> Result<Self, PqrsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PqrsError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            http,
            url: non_empty(config.url.as_deref()),
            api_key: non_empty(config.api_key.as_deref()).map(SecretString::from),
            site_url: non_empty(config.site_url.as_deref()).unwrap_or_default(),
        })
    }

    /// True when both the webhook URL and key are configured.
    pub fn is_enabled(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }

    pub async fn notify(&self, notice: &CaseNotice) -> NotifyOutcome {
        match self.send(notice).await {
            Ok(data) => {
                info!(radicado = %notice.radicado, updated = notice.updated, "notification sent");
                NotifyOutcome {
                    success: true,
                    message: None,
                    data,
                }
            }
            Err(err) => {
                warn!(radicado = %notice.radicado, error = %err, "notification not sent");
                let message = match err {
                    PqrsError::Notification(message) => message,
                    other => other.to_string(),
                };
                NotifyOutcome::failed(message)
            }
        }
    }

    async fn send(&self, notice: &CaseNotice) -> Result<Option<serde_json::Value>, PqrsError> {
        let Some(api_key) = &self.api_key else {
            return Err(PqrsError::Notification("webhook api key is not configured".into()));
        };
        let Some(url) = &self.url else {
            return Err(PqrsError::Notification("webhook url is not configured".into()));
        };

        let body = WebhookBody {
            name: &notice.name,
            email: &notice.email,
            radicado: &notice.radicado,
            comentario: notice.comment.as_deref(),
            updated: notice.updated,
            url: &self.site_url,
        };

        let response = self
            .http
            .post(url.as_str())
            .header(reqwest::header::AUTHORIZATION, api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| PqrsError::Notification(format!("webhook request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        debug!(status = %status, "webhook response received");
        let data = serde_json::from_str::<serde_json::Value>(&text).ok();

        if status.is_success() {
            return Ok(data);
        }

        let message = data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("webhook returned HTTP {status}"));
        Err(PqrsError::Notification(message))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
