// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the PQRS case desk.
//!
//! This crate provides the error taxonomy, the canonical case/audit types, and
//! the traits every backend adapter implements. Nothing here performs I/O.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AttachmentFailure, PqrsError};
pub use traits::{InMemorySessionStore, RecordGateway, SessionStore};
pub use types::{
    AttachmentKind, AttachmentRef, AuditAction, AuditEntry, CaseKind, CaseRecord, CaseStatus,
    CreatedRecord, Employee, FieldMap, RawRecord, ScriptOutcome, SessionToken, Site, Upload,
};
