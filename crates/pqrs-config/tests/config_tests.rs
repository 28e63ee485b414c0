// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the PQRS configuration system.

use pqrs_config::diagnostic::ConfigError;
use pqrs_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with every section deserializes successfully.
#[test]
fn full_toml_deserializes() {
    let toml = r#"
[filemaker]
base_url = "https://fms.example.com"
database = "PQRS-MM"
username = "svc"
password = "secret"
timeout_secs = 10
record_limit = 500

[layouts]
cases = "PQRS_web"
audit = "Bitacora"

[automation]
assignment_script = "AsignarPQRS"

[retry]
max_retries = 3
base_delay_ms = 100
max_delay_ms = 800

[webhook]
url = "https://hooks.example.com/pqrs"
api_key = "hook-key"
site_url = "https://pqrs.example.com"

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.filemaker.base_url.as_deref(), Some("https://fms.example.com"));
    assert_eq!(config.filemaker.database.as_deref(), Some("PQRS-MM"));
    assert_eq!(config.filemaker.timeout_secs, 10);
    assert_eq!(config.filemaker.record_limit, 500);
    assert_eq!(config.layouts.cases, "PQRS_web");
    assert_eq!(config.layouts.audit, "Bitacora");
    // Unspecified layout keys keep their defaults.
    assert_eq!(config.layouts.employees, "Empleado");
    assert_eq!(config.layouts.audit_container_field, "Adjunto");
    assert_eq!(config.automation.assignment_script.as_deref(), Some("AsignarPQRS"));
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.webhook.api_key.as_deref(), Some("hook-key"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    assert!(config.filemaker.base_url.is_none());
    assert_eq!(config.filemaker.record_limit, 2000);
    assert_eq!(config.layouts.cases, "PQRS");
    assert_eq!(config.layouts.audit, "tblPQRSBitacora");
    assert_eq!(config.retry.max_retries, 2);
    assert_eq!(config.retry.base_delay_ms, 1000);
    assert_eq!(config.retry.max_delay_ms, 5000);
    assert!(config.webhook.url.is_none());
    assert_eq!(config.webhook.timeout_secs, 15);
}

/// A misspelled key is rejected with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[filemaker]
databse = "PQRS"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { suggestion: Some(s), .. } if s == "database"
        )
    });
    assert!(found, "expected a `database` suggestion, got: {errors:?}");
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[smtp]
host = "mail"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[retry]
max_retries = "two"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject string for u32");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_load() {
    let toml = r#"
[filemaker]
base_url = "ftp://fms"
"#;
    let errors = load_and_validate_str(toml).expect_err("ftp url is invalid");
    assert!(errors.iter().any(|e| e.to_string().contains("filemaker.base_url")));
}
