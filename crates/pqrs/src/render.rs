// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal and JSON output for CLI commands.

use std::io::IsTerminal;

use colored::Colorize;
use pqrs_cases::summary::format_total;
use pqrs_cases::{CreatedCase, StatusTotals};
use pqrs_core::{AttachmentRef, AuditEntry, CaseRecord, Employee};
use pqrs_notify::NotifyOutcome;
use serde::Serialize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Where command results go: pretty JSON or plain/colored text on stdout.
pub struct Output {
    json: bool,
    color: bool,
}

impl Output {
    pub fn new(json: bool, plain: bool) -> Self {
        Self {
            json,
            color: !plain && std::io::stdout().is_terminal(),
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("pqrs: failed to encode output: {e}"),
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn failure(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn case(&self, case: &CaseRecord) {
        if self.json {
            return self.print_json(case);
        }
        println!("{}", self.heading(&format!("Radicado {}", case.record_id)));
        let rows = [
            ("Tipo", case.kind.map(|k| k.label().to_string())),
            ("Estado", case.status.as_ref().map(|s| s.label().to_string())),
            ("Asignado a", case.assigned_to.clone()),
            ("Solicitante", case.requester_name.clone()),
            ("Documento", document(case)),
            ("Correo", case.email.clone()),
            ("Telefono", case.phone.clone()),
            ("Fecha compra", case.purchase_date.clone()),
            ("Factura", case.invoice_number.clone()),
            ("Area", case.area.clone()),
            ("Creado", case.created_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string())),
        ];
        for (label, value) in rows {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                println!("  {label:<14} {value}");
            }
        }
        if let Some(description) = &case.description {
            println!();
            println!("  {description}");
        }
    }

    pub fn case_list(&self, cases: &[CaseRecord], totals: &StatusTotals) {
        if self.json {
            #[derive(Serialize)]
            struct Listing<'a> {
                totals: &'a StatusTotals,
                cases: &'a [CaseRecord],
            }
            return self.print_json(&Listing { totals, cases });
        }

        let counts: Vec<String> = totals
            .rows()
            .iter()
            .map(|(label, total)| format!("{label}: {}", format_total(*total)))
            .collect();
        println!("  {}", counts.join("  "));
        println!("  {}", "-".repeat(72));
        if cases.is_empty() {
            println!("  no cases");
            return;
        }
        for case in cases {
            println!(
                "  {:<8} {:<12} {:<11} {:<18} {}",
                case.record_id,
                case.kind.map(|k| k.label()).unwrap_or("-"),
                case.status.as_ref().map(|s| s.label()).unwrap_or("-"),
                case.assigned_to
                    .as_deref()
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or("sin asignar"),
                case.requester_name.as_deref().unwrap_or("-"),
            );
        }
    }

    pub fn history(&self, entries: &[AuditEntry]) {
        if self.json {
            return self.print_json(entries);
        }
        if entries.is_empty() {
            println!("  no history");
            return;
        }
        for entry in entries {
            let when = entry
                .timestamp
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {when:<16} {:<14} {}",
                self.heading(entry.action.label()),
                entry.actor.as_deref().unwrap_or("-")
            );
            if let Some(comment) = &entry.comment {
                println!("    {comment}");
            }
            for (label, value) in &entry.details {
                println!("    {label}: {value}");
            }
        }
    }

    pub fn attachments(&self, attachments: &[AttachmentRef]) {
        if self.json {
            return self.print_json(attachments);
        }
        if attachments.is_empty() {
            println!("  no attachments");
            return;
        }
        for attachment in attachments {
            println!(
                "  {:<30} {:<6} {}",
                attachment.name,
                format!("{:?}", attachment.kind).to_lowercase(),
                attachment.url
            );
        }
    }

    pub fn employees(&self, employees: &[Employee]) {
        if self.json {
            return self.print_json(employees);
        }
        for employee in employees {
            println!(
                "  {:<8} {:<30} {:<16} {}",
                employee.record_id,
                employee.name,
                employee.username.as_deref().unwrap_or("-"),
                employee.site_id.as_deref().unwrap_or("-"),
            );
        }
    }

    pub fn created(&self, case: &CreatedCase) {
        if self.json {
            return self.print_json(case);
        }
        println!("{}", self.heading(&format!("Case created, radicado {}", case.record_id)));
        for attachment in &case.attachments {
            match &attachment.error {
                None => println!("  attached {}", attachment.file),
                Some(error) => println!(
                    "  {}",
                    self.failure(&format!("not attached {}: {error}", attachment.file))
                ),
            }
        }
        if !case.audit_logged {
            println!("  {}", self.failure("creation was not recorded in the history"));
        }
        if !case.automation_triggered {
            println!("  assignment was not triggered");
        }
    }

    pub fn notified(&self, outcome: &NotifyOutcome) {
        if self.json {
            return self.print_json(outcome);
        }
        if outcome.success {
            println!("  requester notified");
        } else {
            println!(
                "  {}",
                self.failure(&format!(
                    "requester not notified: {}",
                    outcome.message.as_deref().unwrap_or("unknown error")
                ))
            );
        }
    }

    /// Confirmation for a write command.
    pub fn done(&self, message: &str, value: serde_json::Value) {
        if self.json {
            return self.print_json(&value);
        }
        println!("  {message}");
    }
}

fn document(case: &CaseRecord) -> Option<String> {
    let number = case.document_number.as_deref()?;
    Some(match case.document_type.as_deref() {
        Some(kind) if !kind.trim().is_empty() => format!("{kind} {number}"),
        _ => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_joins_type_and_number() {
        let mut case = CaseRecord {
            document_number: Some("1020304050".into()),
            document_type: Some("CC".into()),
            ..CaseRecord::default()
        };
        assert_eq!(document(&case).as_deref(), Some("CC 1020304050"));
        case.document_type = None;
        assert_eq!(document(&case).as_deref(), Some("1020304050"));
        case.document_number = None;
        assert_eq!(document(&case), None);
    }

    #[test]
    fn plain_output_never_colors() {
        let out = Output::new(false, true);
        assert!(!out.color());
        assert_eq!(out.heading("Radicado 1"), "Radicado 1");
    }
}
