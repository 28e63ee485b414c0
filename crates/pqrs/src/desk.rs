// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Employee case commands.
//!
//! Each invocation signs the employee in, runs one command, and signs out
//! again. A failed command still logs the backend session out.

use clap::Subcommand;
use pqrs_cases::summary::sort_by_created;
use pqrs_cases::{CaseDesk, CaseFilter, EmployeeSession, SortOrder, StatusTotals};
use pqrs_config::PqrsConfig;
use pqrs_core::{CaseRecord, CaseStatus, Employee, PqrsError};
use pqrs_notify::{CaseNotice, NotificationDispatcher};
use secrecy::ExposeSecret;
use serde_json::json;

use crate::prompt;
use crate::render::Output;

#[derive(Subcommand, Debug)]
pub enum DeskCommand {
    /// Show one case.
    Get { record_id: String },
    /// List cases with per-status totals.
    List {
        /// Only show cases in this status, or `Sin asignar`.
        #[arg(long)]
        status: Option<String>,
        /// Oldest cases first.
        #[arg(long)]
        oldest_first: bool,
        /// Maximum number of cases to fetch.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show the bitácora of a case, newest first.
    History { record_id: String },
    /// List the files attached to a case.
    Attachments { record_id: String },
    /// List employees cases can be assigned to.
    Employees {
        /// Only employees of this site.
        #[arg(long)]
        site: Option<String>,
    },
    /// Change the status of a case.
    SetStatus {
        record_id: String,
        status: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Assign a case to an employee (username, name, or record id).
    Reassign {
        record_id: String,
        employee: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Add a comment to the case history.
    Comment {
        record_id: String,
        text: String,
        /// Also email the comment to the requester.
        #[arg(long)]
        notify: bool,
    },
    /// Email the requester an update about their case.
    Notify {
        record_id: String,
        #[arg(long)]
        comment: Option<String>,
    },
}

pub async fn run_desk(
    config: &PqrsConfig,
    out: &Output,
    command: DeskCommand,
) -> Result<(), PqrsError> {
    let (username, password) = prompt::desk_credentials()?;
    let session = CaseDesk::sign_in(config, &username, password.expose_secret()).await?;
    let result = execute(config, out, &session, command).await;
    session.sign_out().await;
    result
}

async fn execute(
    config: &PqrsConfig,
    out: &Output,
    session: &EmployeeSession,
    command: DeskCommand,
) -> Result<(), PqrsError> {
    let desk = &session.desk;
    match command {
        DeskCommand::Get { record_id } => out.case(&desk.get_case(&record_id).await?),
        DeskCommand::List {
            status,
            oldest_first,
            limit,
        } => {
            let cases = desk.list_cases(limit).await?;
            let totals = StatusTotals::tally(&cases);
            let filter = status
                .as_deref()
                .map(CaseFilter::parse)
                .unwrap_or(CaseFilter::All);
            let mut cases = filter.apply(cases);
            let order = if oldest_first {
                SortOrder::OldestFirst
            } else {
                SortOrder::NewestFirst
            };
            sort_by_created(&mut cases, order);
            out.case_list(&cases, &totals);
        }
        DeskCommand::History { record_id } => out.history(&desk.history(&record_id).await?),
        DeskCommand::Attachments { record_id } => {
            out.attachments(&desk.attachments(&record_id).await?);
        }
        DeskCommand::Employees { site } => {
            let employees = match site {
                Some(site) => desk.employees_by_site(&site).await?,
                None => desk.employees().await?,
            };
            out.employees(&employees);
        }
        DeskCommand::SetStatus {
            record_id,
            status,
            comment,
        } => {
            let status = CaseStatus::parse(&status);
            let mod_id = desk
                .update_status(&record_id, &status, session.actor(), comment.as_deref())
                .await?;
            out.done(
                &format!("case {record_id} is now {status}"),
                json!({"record_id": record_id, "status": status, "mod_id": mod_id}),
            );
        }
        DeskCommand::Reassign {
            record_id,
            employee,
            comment,
        } => {
            let employees = desk.employees().await?;
            let assignee = find_employee(&employees, &employee)
                .ok_or_else(|| PqrsError::NotFound(format!("employee {employee}")))?;
            let mod_id = desk
                .reassign(&record_id, assignee, session.actor(), comment.as_deref())
                .await?;
            out.done(
                &format!("case {record_id} assigned to {}", assignee.name),
                json!({"record_id": record_id, "assignee": assignee, "mod_id": mod_id}),
            );
        }
        DeskCommand::Comment {
            record_id,
            text,
            notify,
        } => {
            let entry_id = desk.add_comment(&record_id, &text, session.actor()).await?;
            out.done(
                &format!("comment added to case {record_id}"),
                json!({"record_id": record_id, "entry_id": entry_id}),
            );
            if notify {
                let case = desk.get_case(&record_id).await?;
                notify_requester(config, out, &case, Some(text)).await?;
            }
        }
        DeskCommand::Notify { record_id, comment } => {
            let case = desk.get_case(&record_id).await?;
            notify_requester(config, out, &case, comment).await?;
        }
    }
    Ok(())
}

async fn notify_requester(
    config: &PqrsConfig,
    out: &Output,
    case: &CaseRecord,
    comment: Option<String>,
) -> Result<(), PqrsError> {
    let email = case
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| {
            PqrsError::validation_field("email", format!("case {} has no requester email", case.record_id))
        })?;
    let name = case.requester_name.as_deref().unwrap_or_default();

    let dispatcher = NotificationDispatcher::from_config(&config.webhook)?;
    let outcome = dispatcher
        .notify(&CaseNotice::update(name, email, &case.record_id, comment))
        .await;
    out.notified(&outcome);
    Ok(())
}

/// Matches by record id, then username, then display name.
fn find_employee<'a>(employees: &'a [Employee], needle: &str) -> Option<&'a Employee> {
    let needle = needle.trim();
    employees
        .iter()
        .find(|e| e.record_id == needle)
        .or_else(|| {
            employees.iter().find(|e| {
                e.username
                    .as_deref()
                    .is_some_and(|u| u.eq_ignore_ascii_case(needle))
            })
        })
        .or_else(|| {
            employees
                .iter()
                .find(|e| e.name.to_lowercase() == needle.to_lowercase())
        })
}
