// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for PQRS case desk tests.
//!
//! - [`ScriptedGateway`] - in-memory [`pqrs_core::RecordGateway`] that records
//!   every call and injects failures on demand
//! - [`data_api`] - response bodies and `wiremock` mounts for the FileMaker Data API

pub mod data_api;
pub mod scripted_gateway;

pub use scripted_gateway::{Fault, GatewayCall, Op, ScriptedGateway};
