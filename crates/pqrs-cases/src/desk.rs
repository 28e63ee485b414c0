// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Employee case desk.
//!
//! Reads go through the normalizer so callers only see canonical types.
//! Every change appends an audit entry; the entry is best effort and a
//! failure to write it never undoes the change.

use std::sync::Arc;

use pqrs_config::model::{LayoutConfig, PqrsConfig};
use pqrs_core::{
    AttachmentRef, AuditAction, AuditEntry, CaseRecord, CaseStatus, Employee, FieldMap,
    PqrsError, RecordGateway, Site,
};
use pqrs_filemaker::DataApiClient;
use pqrs_filemaker::normalize::{
    self, AuditDraft, EMPLOYEE_SITE_FIELD, audit_fields, case_fields,
};
use tracing::{debug, info, warn};

use crate::summary::newest_first;

/// Case operations for an authenticated identity.
pub struct CaseDesk {
    gateway: Arc<dyn RecordGateway>,
    layouts: LayoutConfig,
    record_limit: u32,
}

impl CaseDesk {
    pub fn new(gateway: Arc<dyn RecordGateway>, config: &PqrsConfig) -> Self {
        Self {
            gateway,
            layouts: config.layouts.clone(),
            record_limit: config.filemaker.record_limit,
        }
    }

    /// Signs an employee in; the returned session has its own credential cache.
    pub async fn sign_in(
        config: &PqrsConfig,
        username: &str,
        password: &str,
    ) -> Result<EmployeeSession, PqrsError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(PqrsError::validation_field(
                "username",
                "username and password are required",
            ));
        }
        let client = Arc::new(DataApiClient::sign_in(&config.filemaker, username, password).await?);
        info!(user = %username, "employee signed in");
        Ok(EmployeeSession {
            username: username.to_string(),
            desk: CaseDesk::new(client.clone(), config),
            client,
        })
    }

    /// Lists cases, up to `limit` or the configured record limit.
    pub async fn list_cases(&self, limit: Option<u32>) -> Result<Vec<CaseRecord>, PqrsError> {
        let limit = limit.unwrap_or(self.record_limit);
        let records = self.gateway.list(&self.layouts.cases, limit).await?;
        debug!(count = records.len(), "cases listed");
        Ok(records.into_iter().map(normalize::case_from_raw).collect())
    }

    pub async fn get_case(&self, record_id: &str) -> Result<CaseRecord, PqrsError> {
        let raw = self.gateway.get(&self.layouts.cases, record_id).await?;
        Ok(normalize::case_from_raw(raw))
    }

    /// Changes the workflow status and returns the new modification id.
    pub async fn update_status(
        &self,
        record_id: &str,
        status: &CaseStatus,
        actor: Option<&str>,
        comment: Option<&str>,
    ) -> Result<String, PqrsError> {
        if status.label().trim().is_empty() {
            return Err(PqrsError::validation_field("status", "status is required"));
        }
        let previous = self.get_case(record_id).await?.status;

        let mut fields = FieldMap::new();
        fields.insert(case_fields::STATUS.into(), status.label().into());
        let mod_id = self
            .gateway
            .update(&self.layouts.cases, record_id, fields)
            .await?;
        info!(record_id, status = %status, "case status changed");

        let mut entry = AuditDraft::new(record_id, AuditAction::StatusChange)
            .actor(actor)
            .status_change(previous.as_ref().map(CaseStatus::label), status.label());
        if let Some(comment) = comment {
            entry = entry.comment(comment);
        }
        self.append(entry).await;
        Ok(mod_id)
    }

    /// Assigns the case to an employee and returns the new modification id.
    pub async fn reassign(
        &self,
        record_id: &str,
        assignee: &Employee,
        actor: Option<&str>,
        comment: Option<&str>,
    ) -> Result<String, PqrsError> {
        let mut fields = FieldMap::new();
        fields.insert(case_fields::ASSIGNED_TO.into(), assignee.name.clone().into());
        fields.insert(
            case_fields::ASSIGNED_USER_ID.into(),
            assignee.record_id.clone().into(),
        );
        let mod_id = self
            .gateway
            .update(&self.layouts.cases, record_id, fields)
            .await?;
        info!(record_id, assignee = %assignee.name, "case reassigned");

        let mut entry = AuditDraft::new(record_id, AuditAction::Reassignment)
            .actor(actor)
            .assignee(assignee.record_id.clone());
        if let Some(comment) = comment {
            entry = entry.comment(comment);
        }
        self.append(entry).await;
        Ok(mod_id)
    }

    /// Appends a comment to the case history and returns the entry's record id.
    pub async fn add_comment(
        &self,
        record_id: &str,
        comment: &str,
        actor: Option<&str>,
    ) -> Result<String, PqrsError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(PqrsError::validation_field("comment", "comment is required"));
        }
        let entry = AuditDraft::new(record_id, AuditAction::Comment)
            .actor(actor)
            .comment(comment);
        let created = self
            .gateway
            .create(&self.layouts.audit, entry.to_fields())
            .await?;
        Ok(created.record_id)
    }

    /// Audit entries of a case, newest first.
    pub async fn history(&self, record_id: &str) -> Result<Vec<AuditEntry>, PqrsError> {
        let mut query = FieldMap::new();
        query.insert(
            audit_fields::CASE_ID.into(),
            normalize::exact_match(record_id).into(),
        );
        let records = self
            .gateway
            .find(&self.layouts.audit, vec![query], None)
            .await?;
        let mut entries: Vec<AuditEntry> = records
            .into_iter()
            .map(normalize::audit_from_raw)
            .filter(|entry| entry.case_id == record_id)
            .collect();
        entries.sort_by(|a, b| newest_first(&a.timestamp, &b.timestamp));
        Ok(entries)
    }

    pub async fn attachments(&self, record_id: &str) -> Result<Vec<AttachmentRef>, PqrsError> {
        let raw = self.gateway.get(&self.layouts.cases, record_id).await?;
        Ok(normalize::attachments_from_raw(&raw))
    }

    pub async fn employees(&self) -> Result<Vec<Employee>, PqrsError> {
        let records = self
            .gateway
            .list(&self.layouts.employees, self.record_limit)
            .await?;
        Ok(sorted_employees(records.into_iter().map(normalize::employee_from_raw).collect()))
    }

    pub async fn sites(&self) -> Result<Vec<Site>, PqrsError> {
        let records = self
            .gateway
            .list(&self.layouts.sites, self.record_limit)
            .await?;
        let mut sites: Vec<Site> = records.into_iter().map(normalize::site_from_raw).collect();
        sites.sort_by_key(|s| s.name.to_lowercase());
        Ok(sites)
    }

    pub async fn employees_by_site(&self, site_id: &str) -> Result<Vec<Employee>, PqrsError> {
        let mut query = FieldMap::new();
        query.insert(
            EMPLOYEE_SITE_FIELD.into(),
            normalize::exact_match(site_id).into(),
        );
        let records = self
            .gateway
            .find(&self.layouts.employees, vec![query], None)
            .await?;
        Ok(sorted_employees(records.into_iter().map(normalize::employee_from_raw).collect()))
    }

    async fn append(&self, entry: AuditDraft) {
        let action = entry.action.clone();
        if let Err(err) = self
            .gateway
            .create(&self.layouts.audit, entry.to_fields())
            .await
        {
            warn!(case_id = %entry.case_id, action = %action, error = %err, "audit entry not written");
        }
    }
}

fn sorted_employees(mut employees: Vec<Employee>) -> Vec<Employee> {
    employees.sort_by_key(|e| e.name.to_lowercase());
    employees
}

/// A signed-in employee and the desk bound to their session.
pub struct EmployeeSession {
    pub username: String,
    pub desk: CaseDesk,
    client: Arc<DataApiClient>,
}

impl EmployeeSession {
    /// The employee's identity, recorded as the audit actor.
    pub fn actor(&self) -> Option<&str> {
        Some(self.username.as_str())
    }

    /// Logs the session out on the backend.
    pub async fn sign_out(self) {
        self.client.session().end_session().await;
        info!(user = %self.username, "employee signed out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqrs_test_utils::data_api::{self, DB_PATH};
    use pqrs_test_utils::{Fault, GatewayCall, Op, ScriptedGateway};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn desk(gateway: &Arc<ScriptedGateway>) -> CaseDesk {
        CaseDesk::new(gateway.clone(), &PqrsConfig::default())
    }

    fn seeded() -> Arc<ScriptedGateway> {
        Arc::new(
            ScriptedGateway::new()
                .with_record(
                    "PQRS",
                    "12",
                    json!({"Solicitud": "Reclamo", "Estado": "Pendiente", "Asignado_a": ""}),
                )
                .with_record(
                    "tblPQRSBitacora",
                    "1",
                    json!({"fk_PQRS": "12", "Accion": "CREADA", "CreationTimestamp": "01/10/2026 08:00:00"}),
                )
                .with_record(
                    "tblPQRSBitacora",
                    "2",
                    json!({"fk_PQRS": "12", "Accion": "COMENTARIO", "CreationTimestamp": "01/11/2026 09:30:00"}),
                )
                .with_record("tblPQRSBitacora", "3", json!({"fk_PQRS": "99", "Accion": "CREADA"}))
                .with_record("Empleado", "7", json!({"Nombre": "zoe", "fk_Sede": "1"}))
                .with_record("Empleado", "8", json!({"Nombre": "Ana", "fk_Sede": "1"}))
                .with_record("Empleado", "9", json!({"Nombre": "Bruno", "fk_Sede": "2"}))
                .with_record("Sede", "1", json!({"pk_Sede": "1", "Sede": "Norte"}))
                .with_record("Sede", "2", json!({"pk_Sede": "2", "Sede": "Centro"})),
        )
    }

    fn audit_creates(gateway: &ScriptedGateway) -> Vec<FieldMap> {
        gateway.creates_on("tblPQRSBitacora")
    }

    #[tokio::test]
    async fn update_status_patches_and_records_previous_status() {
        let gateway = seeded();
        let mod_id = desk(&gateway)
            .update_status("12", &CaseStatus::Resolved, Some("ana"), Some("Solucionado"))
            .await
            .unwrap();
        assert_eq!(mod_id, "1");

        let entries = audit_creates(&gateway);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["Accion"], json!("CAMBIO_ESTADO"));
        assert_eq!(entries[0]["EstadoPQRSanterior"], json!("Pendiente"));
        assert_eq!(entries[0]["EstadoPQRSnuevo"], json!("Resuelta"));
        assert_eq!(entries[0]["fk_EmpleadoAutor"], json!("ana"));
        assert_eq!(entries[0]["Comentario"], json!("Solucionado"));

        let case = desk(&gateway).get_case("12").await.unwrap();
        assert_eq!(case.status, Some(CaseStatus::Resolved));
    }

    #[tokio::test]
    async fn update_status_of_missing_case_is_not_found_and_writes_nothing() {
        let gateway = seeded();
        let err = desk(&gateway)
            .update_status("404", &CaseStatus::Closed, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PqrsError::NotFound(_)));
        assert!(gateway.calls_to(Op::Update).is_empty());
        assert!(audit_creates(&gateway).is_empty());
    }

    #[tokio::test]
    async fn audit_failure_does_not_undo_the_change() {
        let gateway = seeded();
        gateway.fail(Op::Create, "tblPQRSBitacora", 1, Fault::Rejected);
        let result = desk(&gateway)
            .update_status("12", &CaseStatus::InProgress, None, None)
            .await;
        assert!(result.is_ok());
        assert_eq!(gateway.calls_to(Op::Update).len(), 1);
    }

    #[tokio::test]
    async fn reassign_writes_name_and_id() {
        let gateway = seeded();
        let assignee = Employee {
            record_id: "8".into(),
            name: "Ana".into(),
            username: None,
            site_id: Some("1".into()),
        };
        desk(&gateway)
            .reassign("12", &assignee, Some("jefe"), None)
            .await
            .unwrap();

        match &gateway.calls_to(Op::Update)[0] {
            GatewayCall::Update { fields, .. } => {
                assert_eq!(fields["Asignado_a"], json!("Ana"));
                assert_eq!(fields["Usuario_asignado"], json!("8"));
            }
            other => panic!("unexpected call {other:?}"),
        }
        let entries = audit_creates(&gateway);
        assert_eq!(entries[0]["Accion"], json!("REASIGNACION"));
        assert_eq!(entries[0]["fk_EmpleadoAsignadoNuevo"], json!("8"));
    }

    #[tokio::test]
    async fn blank_comment_is_rejected_without_calls() {
        let gateway = seeded();
        let err = desk(&gateway).add_comment("12", "   ", None).await.unwrap_err();
        assert_eq!(err.field(), Some("comment"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn comment_is_appended() {
        let gateway = seeded();
        let id = desk(&gateway)
            .add_comment("12", " Llamar al cliente ", Some("ana"))
            .await
            .unwrap();
        assert_eq!(id, "1000");
        let entries = audit_creates(&gateway);
        assert_eq!(entries[0]["Accion"], json!("COMENTARIO"));
        assert_eq!(entries[0]["Comentario"], json!("Llamar al cliente"));
    }

    #[tokio::test]
    async fn history_is_filtered_by_case_and_newest_first() {
        let gateway = seeded();
        let history = desk(&gateway).history("12").await.unwrap();
        let ids: Vec<_> = history.iter().map(|e| e.record_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(history[0].action, AuditAction::Comment);
        assert!(desk(&gateway).history("55").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_and_site_lookups_match_ids_exactly() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_record("tblPQRSBitacora", "1", json!({"fk_PQRS": "12", "Accion": "CREADA"}))
                .with_record("tblPQRSBitacora", "2", json!({"fk_PQRS": "120", "Accion": "CREADA"}))
                .with_record("tblPQRSBitacora", "3", json!({"fk_PQRS": "1203", "Accion": "COMENTARIO"}))
                .with_record("Empleado", "7", json!({"Nombre": "Ana", "fk_Sede": "1"}))
                .with_record("Empleado", "8", json!({"Nombre": "Luis", "fk_Sede": "10"})),
        );
        let desk = desk(&gateway);

        let history = desk.history("12").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].case_id, "12");

        let names: Vec<_> = desk
            .employees_by_site("1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Ana"]);

        let queries: Vec<_> = gateway
            .calls_to(Op::Find)
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Find { query, .. } => Some(query),
                _ => None,
            })
            .collect();
        assert_eq!(queries[0][0]["fk_PQRS"], json!("==12"));
        assert_eq!(queries[1][0]["fk_Sede"], json!("==1"));
    }

    #[tokio::test]
    async fn directories_are_sorted_by_name() {
        let gateway = seeded();
        let desk = desk(&gateway);
        let names: Vec<_> = desk.employees().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Ana", "Bruno", "zoe"]);

        let sites: Vec<_> = desk.sites().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(sites, vec!["Centro", "Norte"]);

        let north: Vec<_> = desk
            .employees_by_site("1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(north, vec!["Ana", "zoe"]);
    }

    #[tokio::test]
    async fn list_uses_configured_limit() {
        let gateway = seeded();
        let cases = desk(&gateway).list_cases(None).await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(
            gateway.calls_to(Op::List)[0],
            GatewayCall::List {
                layout: "PQRS".into(),
                limit: 2000
            }
        );
    }

    #[tokio::test]
    async fn sign_in_binds_desk_to_employee_session() {
        let server = MockServer::start().await;
        // "ana:pw" in base64.
        Mock::given(method("POST"))
            .and(path(format!("{DB_PATH}/sessions")))
            .and(header("authorization", "Basic YW5hOnB3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(data_api::token_body("emp")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DB_PATH}/layouts/PQRS/records/12")))
            .and(header("authorization", "Bearer emp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(data_api::ok(json!({
                "data": [data_api::record_json("12", "3", json!({"Estado": "Pendiente"}))]
            }))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{DB_PATH}/sessions/emp")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = data_api::pqrs_config(&server.uri());
        let session = CaseDesk::sign_in(&config, "ana", "pw").await.unwrap();
        assert_eq!(session.actor(), Some("ana"));
        let case = session.desk.get_case("12").await.unwrap();
        assert_eq!(case.status, Some(CaseStatus::Pending));
        session.sign_out().await;
    }

    #[tokio::test]
    async fn sign_in_requires_both_values() {
        let err = CaseDesk::sign_in(&PqrsConfig::default(), "ana", "")
            .await
            .err()
            .unwrap();
        assert_eq!(err.field(), Some("username"));
    }
}
