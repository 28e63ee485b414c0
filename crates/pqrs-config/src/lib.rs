// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the PQRS case desk.
//!
//! TOML files in the XDG hierarchy are merged with `PQRS_*` environment
//! overrides, rejected on unknown keys, and validated after deserialization.
//! Errors render as miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use pqrs_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("cases layout: {}", config.layouts.cases);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PqrsConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `PqrsConfig` or every diagnostic found.
pub fn load_and_validate() -> Result<PqrsConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<PqrsConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<PqrsConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

fn finish(loaded: Result<PqrsConfig, figment::Error>) -> Result<PqrsConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}
