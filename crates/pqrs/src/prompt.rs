// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Employee credentials via environment variables or TTY prompt.

use std::io::{BufRead, IsTerminal, Write};

use pqrs_core::PqrsError;
use secrecy::SecretString;

/// Employee username for non-interactive use.
pub const USER_ENV_VAR: &str = "DESK_USER";

/// Employee password for non-interactive use.
pub const PASSWORD_ENV_VAR: &str = "DESK_PASSWORD";

/// Get the employee's username and password.
///
/// Priority:
/// 1. `DESK_USER` / `DESK_PASSWORD` environment variables (scripts, CI)
/// 2. Interactive TTY prompt, with `rpassword` for the password
pub fn desk_credentials() -> Result<(String, SecretString), PqrsError> {
    let username = match non_empty_env(USER_ENV_VAR) {
        Some(username) => username,
        None => read_username()?,
    };

    if let Some(password) = non_empty_env(PASSWORD_ENV_VAR) {
        return Ok((username, SecretString::from(password)));
    }

    if std::io::stdin().is_terminal() {
        eprint!("Password for {username}: ");
        let password = rpassword::read_password()
            .map_err(|e| PqrsError::Internal(format!("failed to read password: {e}")))?;
        if password.is_empty() {
            return Err(PqrsError::validation_field("password", "password is required"));
        }
        return Ok((username, SecretString::from(password)));
    }

    Err(PqrsError::validation_field(
        "password",
        format!("no password provided. Set {PASSWORD_ENV_VAR} or run interactively."),
    ))
}

fn read_username() -> Result<String, PqrsError> {
    if !std::io::stdin().is_terminal() {
        return Err(PqrsError::validation_field(
            "username",
            format!("no username provided. Set {USER_ENV_VAR} or run interactively."),
        ));
    }
    eprint!("Username: ");
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| PqrsError::Internal(format!("failed to read username: {e}")))?;
    let username = line.trim().to_string();
    if username.is_empty() {
        return Err(PqrsError::validation_field("username", "username is required"));
    }
    Ok(username)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
