// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case creation with best-effort follow-up writes.
//!
//! [`CaseWriter::create_case`] validates and submits a form, then stores
//! attachments, appends the "created" audit entry, and runs the assignment
//! script. Follow-up failures are logged and reported on the returned
//! [`CreatedCase`], never as an error.

use std::sync::Arc;

use pqrs_config::model::{LayoutConfig, PqrsConfig};
use pqrs_core::{AttachmentFailure, AuditAction, FieldMap, PqrsError, RecordGateway, Upload};
use pqrs_filemaker::normalize::AuditDraft;
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::form::CaseForm;
use crate::retry::{Backoff, retry_on_auth_expiry};

/// Progress of one create call, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CreateStage {
    Validating,
    Submitting,
    Created,
    Rejected,
    Attaching,
    Logging,
    Automating,
    Done,
}

/// Result of storing one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentOutcome {
    pub file: String,
    pub success: bool,
    pub error: Option<String>,
}

/// A created case and the outcome of its follow-up writes.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedCase {
    /// Backend identifier, also the requester's radicado.
    pub record_id: String,
    /// Fields as submitted on the successful attempt.
    pub fields: FieldMap,
    pub attachments: Vec<AttachmentOutcome>,
    pub audit_logged: bool,
    pub automation_triggered: bool,
}

impl CreatedCase {
    pub fn failed_attachments(&self) -> Vec<AttachmentFailure> {
        self.attachments
            .iter()
            .filter(|a| !a.success)
            .map(|a| AttachmentFailure {
                file: a.file.clone(),
                error: a.error.clone().unwrap_or_default(),
            })
            .collect()
    }

    /// [`PqrsError::PartialFailure`] when at least one attachment was not stored.
    pub fn attachment_result(&self) -> Result<(), PqrsError> {
        let failed = self.failed_attachments();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(PqrsError::PartialFailure {
                failed,
                total: self.attachments.len(),
            })
        }
    }
}

/// Creates cases through a [`RecordGateway`].
pub struct CaseWriter {
    gateway: Arc<dyn RecordGateway>,
    layouts: LayoutConfig,
    assignment_script: Option<String>,
    backoff: Backoff,
}

impl CaseWriter {
    pub fn new(gateway: Arc<dyn RecordGateway>, config: &PqrsConfig) -> Self {
        Self {
            gateway,
            layouts: config.layouts.clone(),
            assignment_script: config
                .automation
                .assignment_script
                .clone()
                .filter(|s| !s.trim().is_empty()),
            backoff: Backoff::from_config(&config.retry),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Validates, submits, and runs the follow-up writes for one form.
    ///
    /// Returns as soon as validation fails, without any backend call. The
    /// submit is repeated with backoff while authorization keeps failing;
    /// follow-up writes run once, after the successful attempt.
    pub async fn create_case(&self, form: &CaseForm) -> Result<CreatedCase, PqrsError> {
        debug!(stage = %CreateStage::Validating, "create case");
        form.validate()?;

        debug!(stage = %CreateStage::Submitting, "create case");
        let submitted = retry_on_auth_expiry(self.backoff, self.gateway.as_ref(), |attempt| {
            let fields = form.to_fields();
            async move {
                debug!(attempt, layout = %self.layouts.cases, "submitting case");
                let created = self.gateway.create(&self.layouts.cases, fields.clone()).await?;
                Ok((fields, created))
            }
        })
        .await;

        let (fields, created) = match submitted {
            Ok(submitted) => submitted,
            Err(err) => {
                debug!(stage = %CreateStage::Rejected, error = %err, "create case");
                return Err(err);
            }
        };
        let record_id = created.record_id;
        info!(record_id = %record_id, stage = %CreateStage::Created, "case created");

        let attachments = self.store_attachments(&record_id, &form.attachments).await;
        let audit_logged = self.log_created(&record_id).await;
        let automation_triggered = self.trigger_assignment(&record_id).await;

        debug!(
            record_id = %record_id,
            stage = %CreateStage::Done,
            audit_logged,
            automation_triggered,
            "create case"
        );
        Ok(CreatedCase {
            record_id,
            fields,
            attachments,
            audit_logged,
            automation_triggered,
        })
    }

    async fn store_attachments(&self, record_id: &str, files: &[Upload]) -> Vec<AttachmentOutcome> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            debug!(record_id, file = %file.name, stage = %CreateStage::Attaching, "create case");
            let outcome = match self.store_attachment(record_id, file).await {
                Ok(()) => AttachmentOutcome {
                    file: file.name.clone(),
                    success: true,
                    error: None,
                },
                Err(err) => {
                    warn!(record_id, file = %file.name, error = %err, "attachment not stored");
                    AttachmentOutcome {
                        file: file.name.clone(),
                        success: false,
                        error: Some(err.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Appends an attachment audit entry and uploads the bytes into its container.
    async fn store_attachment(&self, record_id: &str, file: &Upload) -> Result<(), PqrsError> {
        let entry = AuditDraft::new(record_id, AuditAction::Attachment).comment(file.name.clone());
        let created = self
            .gateway
            .create(&self.layouts.audit, entry.to_fields())
            .await?;
        self.gateway
            .upload_container(
                &self.layouts.audit,
                &created.record_id,
                &self.layouts.audit_container_field,
                file,
            )
            .await
    }

    async fn log_created(&self, record_id: &str) -> bool {
        debug!(record_id, stage = %CreateStage::Logging, "create case");
        let entry = AuditDraft::new(record_id, AuditAction::Created);
        match self.gateway.create(&self.layouts.audit, entry.to_fields()).await {
            Ok(_) => true,
            Err(err) => {
                warn!(record_id, error = %err, "created audit entry not written");
                false
            }
        }
    }

    async fn trigger_assignment(&self, record_id: &str) -> bool {
        let Some(script) = self.assignment_script.as_deref() else {
            return false;
        };
        debug!(record_id, script, stage = %CreateStage::Automating, "create case");
        match self
            .gateway
            .run_script(&self.layouts.cases, script, Some(record_id))
            .await
        {
            Ok(outcome) if outcome.succeeded() => true,
            Ok(outcome) => {
                warn!(
                    record_id,
                    script,
                    script_error = ?outcome.error_code,
                    "assignment script reported an error"
                );
                false
            }
            Err(err) => {
                warn!(record_id, script, error = %err, "assignment script not run");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqrs_test_utils::{Fault, GatewayCall, Op, ScriptedGateway};
    use serde_json::json;
    use tracing_test::traced_test;

    fn config() -> PqrsConfig {
        let mut config = PqrsConfig::default();
        config.automation.assignment_script = Some("AsignarPQRS".into());
        config
    }

    fn queja() -> CaseForm {
        CaseForm {
            kind: "queja".into(),
            requester_name: "Ana Ruiz".into(),
            document_type: "CC".into(),
            document_number: "1020304050".into(),
            email: "ana@example.com".into(),
            phone: "3001234567".into(),
            description: "Pedido incompleto".into(),
            data_consent: true,
            ..CaseForm::default()
        }
    }

    fn writer(gateway: &Arc<ScriptedGateway>, config: &PqrsConfig) -> CaseWriter {
        CaseWriter::new(gateway.clone(), config)
    }

    fn actions(gateway: &ScriptedGateway) -> Vec<String> {
        gateway
            .creates_on("tblPQRSBitacora")
            .iter()
            .map(|f| f["Accion"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn queja_end_to_end() {
        let gateway = Arc::new(ScriptedGateway::starting_at(345));
        let created = writer(&gateway, &config()).create_case(&queja()).await.unwrap();

        assert_eq!(created.record_id, "345");
        let cases = gateway.creates_on("PQRS");
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0]["Solicitud"], json!("Queja"));
        assert_eq!(actions(&gateway), vec!["CREADA"]);
        assert_eq!(
            gateway.calls_to(Op::Script),
            vec![GatewayCall::Script {
                layout: "PQRS".into(),
                script: "AsignarPQRS".into(),
                param: Some("345".into()),
            }]
        );
        assert!(created.audit_logged);
        assert!(created.automation_triggered);
        assert!(created.attachments.is_empty());
        assert!(created.attachment_result().is_ok());
    }

    #[tokio::test]
    async fn missing_mandatory_field_makes_no_calls() {
        let gateway = Arc::new(ScriptedGateway::new());
        let mut form = queja();
        form.phone.clear();

        let err = writer(&gateway, &config()).create_case(&form).await.unwrap_err();
        assert_eq!(err.field(), Some("phone"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn second_of_three_attachments_fails() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail_nth_upload(2);
        let mut form = queja();
        form.attachments = vec![
            Upload::new("factura.pdf", b"%PDF".to_vec()),
            Upload::new("foto.jpg", vec![0xff, 0xd8]),
            Upload::new("garantia.pdf", b"%PDF".to_vec()),
        ];

        let created = writer(&gateway, &config()).create_case(&form).await.unwrap();

        assert_eq!(created.attachments.len(), 3);
        let failed: Vec<_> = created.attachments.iter().filter(|a| !a.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].file, "foto.jpg");
        match created.attachment_result() {
            Err(PqrsError::PartialFailure { failed, total }) => {
                assert_eq!(total, 3);
                assert_eq!(failed[0].file, "foto.jpg");
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
        assert_eq!(
            actions(&gateway),
            vec!["ADJUNTO", "ADJUNTO", "ADJUNTO", "CREADA"]
        );
        let uploads = gateway.calls_to(Op::Upload);
        assert_eq!(uploads.len(), 3);
        assert!(matches!(
            &uploads[0],
            GatewayCall::Upload { layout, field, .. } if layout == "tblPQRSBitacora" && field == "Adjunto"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_auth_failure_exhausts_outer_retry() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail(Op::Create, "PQRS", 10, Fault::AuthExpired);

        let err = writer(&gateway, &config()).create_case(&queja()).await.unwrap_err();

        assert!(matches!(err, PqrsError::SessionExpired));
        assert_eq!(gateway.creates_on("PQRS").len(), 3);
        assert_eq!(gateway.invalidations(), 2);
        assert!(gateway.creates_on("tblPQRSBitacora").is_empty());
        assert!(gateway.calls_to(Op::Script).is_empty());
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn side_effects_run_once_after_retried_submit() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail(Op::Create, "PQRS", 1, Fault::AuthExpired);

        let created = writer(&gateway, &config()).create_case(&queja()).await.unwrap();

        assert_eq!(gateway.creates_on("PQRS").len(), 2);
        assert_eq!(actions(&gateway), vec!["CREADA"]);
        assert_eq!(gateway.calls_to(Op::Script).len(), 1);
        assert_eq!(created.record_id, "1000");
        assert!(logs_contain("authorization lost during write, retrying"));
    }

    #[tokio::test]
    async fn backend_rejection_is_returned_without_retry() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail(Op::Create, "PQRS", 1, Fault::Rejected);

        let err = writer(&gateway, &config()).create_case(&queja()).await.unwrap_err();
        assert!(matches!(err, PqrsError::Validation { field: None, .. }));
        assert_eq!(gateway.calls().len(), 1);
        assert_eq!(gateway.invalidations(), 0);
    }

    #[tokio::test]
    async fn follow_up_failures_do_not_fail_creation() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail(Op::Create, "tblPQRSBitacora", 1, Fault::Transport);
        gateway.fail(Op::Script, "PQRS", 1, Fault::Rejected);

        let created = writer(&gateway, &config()).create_case(&queja()).await.unwrap();
        assert!(!created.audit_logged);
        assert!(!created.automation_triggered);
    }

    #[tokio::test]
    async fn no_script_configured_skips_automation() {
        let gateway = Arc::new(ScriptedGateway::new());
        let created = writer(&gateway, &PqrsConfig::default())
            .create_case(&queja())
            .await
            .unwrap();
        assert!(!created.automation_triggered);
        assert!(gateway.calls_to(Op::Script).is_empty());
        assert_eq!(actions(&gateway), vec!["CREADA"]);
    }
}
