// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the PQRS case desk.

use thiserror::Error;

/// One attachment that could not be stored alongside a created case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFailure {
    /// File name as supplied by the requester.
    pub file: String,
    /// Error text from the failed step (audit entry or container upload).
    pub error: String,
}

/// The primary error type used by every gateway, orchestrator, and desk operation.
#[derive(Debug, Error)]
pub enum PqrsError {
    /// A required setting is missing or malformed (base URL, database, credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// The backend rejected the credential exchange.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The session was rejected again after one reauthentication and retry.
    ///
    /// Callers must wipe credentials and force a new sign-in.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// A create call still failed authentication after the gateway's inner retry.
    ///
    /// Only the write orchestrator reacts to this, by repeating the whole
    /// create sequence with backoff.
    #[error("authorization lost while creating the record")]
    AuthExpiredDuringWrite,

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A mandatory field is missing, or the backend rejected the payload.
    #[error("validation error: {message}")]
    Validation {
        /// Field that failed validation, when known.
        field: Option<String>,
        message: String,
    },

    /// The case was created but some attachments could not be stored.
    #[error("{} of {total} attachments failed", failed.len())]
    PartialFailure {
        failed: Vec<AttachmentFailure>,
        total: usize,
    },

    /// The notification webhook failed. Never escapes the dispatcher.
    #[error("notification failed: {0}")]
    Notification(String),

    /// Transport failure (connection, TLS, timeout).
    #[error("http error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors (unparseable responses, poisoned state).
    #[error("internal error: {0}")]
    Internal(String),
}

impl PqrsError {
    /// Validation error for a named field.
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Validation error reported by the backend, with no field attribution.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Returns true for both session-expiry conditions.
    pub fn is_auth_expiry(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::AuthExpiredDuringWrite)
    }

    /// Returns true when the caller has to drop its credentials and sign in again.
    pub fn requires_relogin(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Authentication(_))
    }

    /// The field named by a validation error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
