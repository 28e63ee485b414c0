// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case workflows for the PQRS desk.
//!
//! - [`CaseWriter`] creates cases from intake forms, retrying the submit with
//!   backoff when authorization is lost, then stores attachments, logs the
//!   creation, and triggers assignment
//! - [`CaseDesk`] is the employee side: status changes, reassignment,
//!   comments, history, and directories
//! - [`summary`] has the list-view helpers

pub mod desk;
pub mod form;
pub mod orchestrator;
pub mod retry;
pub mod summary;

pub use desk::{CaseDesk, EmployeeSession};
pub use form::CaseForm;
pub use orchestrator::{AttachmentOutcome, CaseWriter, CreateStage, CreatedCase};
pub use retry::Backoff;
pub use summary::{CaseFilter, SortOrder, StatusTotals};
