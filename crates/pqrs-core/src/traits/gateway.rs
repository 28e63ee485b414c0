// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record gateway trait for authenticated layout operations.

use async_trait::async_trait;

use crate::error::PqrsError;
use crate::types::{CreatedRecord, FieldMap, RawRecord, ScriptOutcome, Upload};

/// Authenticated CRUD/find access to named layouts.
///
/// Implementations own the session lifecycle: every call obtains a credential,
/// and an expired credential is renewed and the call retried exactly once
/// before [`PqrsError::SessionExpired`] is returned. `create` reports that
/// condition as [`PqrsError::AuthExpiredDuringWrite`] instead.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Lists up to `limit` records of a layout.
    async fn list(&self, layout: &str, limit: u32) -> Result<Vec<RawRecord>, PqrsError>;

    /// Fetches one record. A missing record is always [`PqrsError::NotFound`].
    async fn get(&self, layout: &str, record_id: &str) -> Result<RawRecord, PqrsError>;

    /// Runs a structured query; each map is one OR-ed request of AND-ed fields.
    ///
    /// No matching records yields an empty vector, not an error.
    async fn find(
        &self,
        layout: &str,
        query: Vec<FieldMap>,
        limit: Option<u32>,
    ) -> Result<Vec<RawRecord>, PqrsError>;

    /// Creates a record and returns the backend-assigned identifier.
    async fn create(&self, layout: &str, fields: FieldMap) -> Result<CreatedRecord, PqrsError>;

    /// Patches fields of an existing record and returns the new modification id.
    async fn update(
        &self,
        layout: &str,
        record_id: &str,
        fields: FieldMap,
    ) -> Result<String, PqrsError>;

    /// Stores a file in a container field of an existing record.
    async fn upload_container(
        &self,
        layout: &str,
        record_id: &str,
        field: &str,
        file: &Upload,
    ) -> Result<(), PqrsError>;

    /// Runs a backend script in the context of a layout.
    async fn run_script(
        &self,
        layout: &str,
        script: &str,
        param: Option<&str>,
    ) -> Result<ScriptOutcome, PqrsError>;

    /// Drops the cached credential so the next call reauthenticates.
    fn invalidate_session(&self);
}
