// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Desk list views: status totals, filters, and ordering.

use std::cmp::Ordering;

use pqrs_core::{CaseRecord, CaseStatus};
use serde::Serialize;

/// Totals at or above this are shown as `+N`.
const TOTAL_DISPLAY_CAP: usize = 500;

/// Case counts per desk filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTotals {
    pub all: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
    pub unassigned: usize,
}

impl StatusTotals {
    pub fn tally<'a>(cases: impl IntoIterator<Item = &'a CaseRecord>) -> Self {
        let mut totals = Self::default();
        for case in cases {
            totals.all += 1;
            match case.status {
                Some(CaseStatus::Pending) => totals.pending += 1,
                Some(CaseStatus::InProgress) => totals.in_progress += 1,
                Some(CaseStatus::Resolved) => totals.resolved += 1,
                Some(CaseStatus::Closed) => totals.closed += 1,
                _ => {}
            }
            if case.is_unassigned() {
                totals.unassigned += 1;
            }
        }
        totals
    }

    /// Labelled rows in desk order.
    pub fn rows(&self) -> [(&'static str, usize); 6] {
        [
            ("Todos", self.all),
            ("Pendiente", self.pending),
            ("En Proceso", self.in_progress),
            ("Resuelta", self.resolved),
            ("Cerrada", self.closed),
            ("Sin asignar", self.unassigned),
        ]
    }
}

/// Renders a total for display, flagging counts at the record limit with `+`.
pub fn format_total(total: usize) -> String {
    if total >= TOTAL_DISPLAY_CAP {
        format!("+{total}")
    } else {
        total.to_string()
    }
}

/// Which cases a desk list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseFilter {
    All,
    Status(CaseStatus),
    Unassigned,
}

impl CaseFilter {
    /// Parses a desk filter label (`Todos`, `Sin asignar`, or a status).
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "" | "todos" | "all" => Self::All,
            "sin asignar" | "unassigned" => Self::Unassigned,
            _ => Self::Status(CaseStatus::parse(input)),
        }
    }

    pub fn matches(&self, case: &CaseRecord) -> bool {
        match self {
            Self::All => true,
            Self::Unassigned => case.is_unassigned(),
            Self::Status(status) => case.status.as_ref() == Some(status),
        }
    }

    pub fn apply(&self, cases: Vec<CaseRecord>) -> Vec<CaseRecord> {
        cases.into_iter().filter(|c| self.matches(c)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Sorts by creation time. Cases without a timestamp count as the oldest.
pub fn sort_by_created(cases: &mut [CaseRecord], order: SortOrder) {
    cases.sort_by(|a, b| {
        let ordering = a.created_at.cmp(&b.created_at);
        match order {
            SortOrder::NewestFirst => ordering.reverse(),
            SortOrder::OldestFirst => ordering,
        }
    });
}

/// Orders `None` after every timestamp, for newest-first lists.
pub(crate) fn newest_first<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
