// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the case logic and the backend.
//!
//! [`RecordGateway`] uses `#[async_trait]` for dynamic dispatch so the
//! orchestrator and desk can run against the Data API client or a test double.

pub mod gateway;
pub mod session;

pub use gateway::RecordGateway;
pub use session::{InMemorySessionStore, SessionStore};
