// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `/etc/pqrs/pqrs.toml` < `~/.config/pqrs/pqrs.toml` <
//! `./pqrs.toml` < `PQRS_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PqrsConfig;

/// Config sections, in the order their env prefixes are matched.
const SECTIONS: &[&str] = &[
    "filemaker",
    "layouts",
    "automation",
    "retry",
    "webhook",
    "logging",
];

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<PqrsConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PqrsConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PqrsConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PqrsConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PqrsConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PqrsConfig::default()))
        .merge(Toml::file("/etc/pqrs/pqrs.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("pqrs/pqrs.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("pqrs.toml"))
        .merge(env_provider())
}

/// Maps `PQRS_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `PQRS_FILEMAKER_BASE_URL` is `filemaker.base_url`, not `filemaker.base.url`.
fn env_provider() -> Env {
    Env::prefixed("PQRS_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key_str)
            .into()
    })
}
