// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the PQRS case desk.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of silently falling back to a default.

use std::fmt;

use serde::{Deserialize, Serialize};

const REDACTED: &str = "[REDACTED]";

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PqrsConfig {
    /// FileMaker Data API connection and service credentials.
    #[serde(default)]
    pub filemaker: FileMakerConfig,

    /// Layout and field names on the backend.
    #[serde(default)]
    pub layouts: LayoutConfig,

    /// Backend scripts triggered after writes.
    #[serde(default)]
    pub automation: AutomationConfig,

    /// Outer retry policy for case creation.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Email notification webhook.
    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// FileMaker Data API settings.
///
/// `base_url`, `database`, `username`, and `password` are required for any
/// backend call; their absence surfaces as a configuration error when the
/// client is built, not at load time.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileMakerConfig {
    /// Server root, e.g. `https://fms.example.com`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Hosted database name.
    #[serde(default)]
    pub database: Option<String>,

    /// Service account used for requester-facing calls.
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Per-request network timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound for list requests (`_limit`).
    #[serde(default = "default_record_limit")]
    pub record_limit: u32,
}

impl Default for FileMakerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            database: None,
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            record_limit: default_record_limit(),
        }
    }
}

impl fmt::Debug for FileMakerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMakerConfig")
            .field("base_url", &self.base_url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("timeout_secs", &self.timeout_secs)
            .field("record_limit", &self.record_limit)
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_record_limit() -> u32 {
    2000
}

/// Backend layout names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default = "default_cases_layout")]
    pub cases: String,

    /// Bitácora layout.
    #[serde(default = "default_audit_layout")]
    pub audit: String,

    #[serde(default = "default_employees_layout")]
    pub employees: String,

    #[serde(default = "default_sites_layout")]
    pub sites: String,

    /// Container field on the audit layout that receives attachment bytes.
    #[serde(default = "default_audit_container_field")]
    pub audit_container_field: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cases: default_cases_layout(),
            audit: default_audit_layout(),
            employees: default_employees_layout(),
            sites: default_sites_layout(),
            audit_container_field: default_audit_container_field(),
        }
    }
}

fn default_cases_layout() -> String {
    "PQRS".to_string()
}

fn default_audit_layout() -> String {
    "tblPQRSBitacora".to_string()
}

fn default_employees_layout() -> String {
    "Empleado".to_string()
}

fn default_sites_layout() -> String {
    "Sede".to_string()
}

fn default_audit_container_field() -> String {
    "Adjunto".to_string()
}

/// Backend automation settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationConfig {
    /// Script run with the new record id after a case is created. `None` skips it.
    #[serde(default)]
    pub assignment_script: Option<String>,
}

/// Outer create retry: `max_retries` extra attempts, delay doubling from
/// `base_delay_ms` up to `max_delay_ms`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    5000
}

/// Email notification webhook. Any missing value disables notifications.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: Option<String>,

    /// Sent verbatim in the `Authorization` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Public site URL included in emails so requesters can look up their case.
    #[serde(default)]
    pub site_url: Option<String>,

    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            site_url: None,
            timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("site_url", &self.site_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_webhook_timeout_secs() -> u64 {
    15
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
