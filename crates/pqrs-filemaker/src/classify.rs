// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response classification.
//!
//! The backend does not report failures consistently: an expired session can
//! be HTTP 401 or code 952 on another status, and a missing record can be
//! HTTP 404, code 101, or only a message string. Everything is folded here
//! into one of three outcomes.

use pqrs_core::PqrsError;
use reqwest::StatusCode;

use crate::wire::Envelope;

/// Application code for an invalid or expired session token.
pub const INVALID_SESSION_CODE: &str = "952";

/// Application code for "record is missing".
pub const RECORD_MISSING_CODE: &str = "101";

/// Application code for "no records match the request" (`_find` and empty lists).
pub const NO_RECORDS_MATCH_CODE: &str = "401";

/// Lowercase phrases that mean the record does not exist.
const NOT_FOUND_PHRASES: &[&str] = &[
    "record is missing",
    "not found",
    "no encontrado",
    "no existe",
    "does not exist",
];

/// How a response should be handled by the caller.
#[derive(Debug)]
pub enum Classified {
    Success(Envelope),
    /// Renew the session and retry.
    AuthFailure,
    Failure(PqrsError),
}

/// Options that change how an otherwise failed response is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadMode {
    /// Treat code 401 as an empty successful result.
    pub no_match_is_empty: bool,
}

/// Classify a Data API response from its status and raw body.
pub fn classify(status: StatusCode, body: &str, mode: ReadMode) -> Classified {
    let parsed = serde_json::from_str::<Envelope>(body);

    let envelope = match parsed {
        Ok(envelope) => envelope,
        Err(_) if status == StatusCode::UNAUTHORIZED => return Classified::AuthFailure,
        Err(_) if status == StatusCode::NOT_FOUND => {
            return Classified::Failure(PqrsError::NotFound("record not found".into()));
        }
        Err(e) if status.is_success() => {
            return Classified::Failure(PqrsError::Internal(format!(
                "failed to parse Data API response: {e}"
            )));
        }
        Err(_) => {
            return Classified::Failure(PqrsError::rejected(format!(
                "backend returned HTTP {status}"
            )));
        }
    };

    if status == StatusCode::UNAUTHORIZED || envelope.has_code(INVALID_SESSION_CODE) {
        return Classified::AuthFailure;
    }

    if status.is_success() && envelope.is_ok() {
        return Classified::Success(envelope);
    }

    if mode.no_match_is_empty && envelope.has_code(NO_RECORDS_MATCH_CODE) {
        return Classified::Success(Envelope {
            response: serde_json::Value::Null,
            messages: Vec::new(),
        });
    }

    let message = envelope.first_message().map(str::to_string);

    if status == StatusCode::NOT_FOUND
        || envelope.has_code(RECORD_MISSING_CODE)
        || envelope.has_code(NO_RECORDS_MATCH_CODE)
        || message.as_deref().is_some_and(is_not_found_phrase)
    {
        return Classified::Failure(PqrsError::NotFound(
            message.unwrap_or_else(|| "record not found".to_string()),
        ));
    }

    Classified::Failure(PqrsError::rejected(
        message.unwrap_or_else(|| format!("backend rejected the request (HTTP {status})")),
    ))
}

/// Case-insensitive substring match against the known "missing" phrases.
pub fn is_not_found_phrase(message: &str) -> bool {
    let lower = message.to_lowercase();
    NOT_FOUND_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
