// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::PqrsConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one. Missing
/// backend settings are not errors here: they are reported when a client is
/// built, so commands that never touch the backend still run.
pub fn validate_config(config: &PqrsConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if let Some(url) = config.filemaker.base_url.as_deref()
        && !is_http_url(url)
    {
        fail(format!(
            "filemaker.base_url `{url}` must start with http:// or https://"
        ));
    }

    if config.filemaker.timeout_secs == 0 {
        fail("filemaker.timeout_secs must be greater than 0".to_string());
    }

    if config.filemaker.record_limit == 0 {
        fail("filemaker.record_limit must be greater than 0".to_string());
    }

    for (key, value) in [
        ("layouts.cases", &config.layouts.cases),
        ("layouts.audit", &config.layouts.audit),
        ("layouts.employees", &config.layouts.employees),
        ("layouts.sites", &config.layouts.sites),
        (
            "layouts.audit_container_field",
            &config.layouts.audit_container_field,
        ),
    ] {
        if value.trim().is_empty() {
            fail(format!("{key} must not be empty"));
        }
    }

    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        fail(format!(
            "retry.max_delay_ms ({}) must be at least retry.base_delay_ms ({})",
            config.retry.max_delay_ms, config.retry.base_delay_ms
        ));
    }

    if let Some(url) = config.webhook.url.as_deref()
        && !url.trim().is_empty()
        && !is_http_url(url)
    {
        fail(format!(
            "webhook.url `{url}` must start with http:// or https://"
        ));
    }

    if config.webhook.timeout_secs == 0 {
        fail("webhook.timeout_secs must be greater than 0".to_string());
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        fail(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}
