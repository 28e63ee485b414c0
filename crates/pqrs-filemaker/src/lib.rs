// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FileMaker Data API adapter for the PQRS case desk.
//!
//! [`SessionManager`] owns the credential exchange and the session store.
//! [`DataApiClient`] implements [`pqrs_core::RecordGateway`] on top of it,
//! renewing an expired session and retrying a call exactly once.
//! [`normalize`] turns backend records into canonical domain types.

pub mod classify;
pub mod client;
pub mod normalize;
pub mod session;
pub mod wire;

pub use client::DataApiClient;
pub use session::{Credentials, SessionManager};
