// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pqrs create`: case intake under the service account.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pqrs_cases::{CaseForm, CaseWriter};
use pqrs_config::PqrsConfig;
use pqrs_core::{PqrsError, Upload};
use pqrs_filemaker::DataApiClient;
use pqrs_notify::{CaseNotice, NotificationDispatcher};
use tracing::info;

use crate::render::Output;

pub async fn run_create(
    config: &PqrsConfig,
    out: &Output,
    form_path: &Path,
    attachments: &[PathBuf],
    notify: bool,
) -> Result<(), PqrsError> {
    let mut form = read_form(form_path)?;
    form.attachments = attachments
        .iter()
        .map(|path| read_upload(path))
        .collect::<Result<_, _>>()?;

    let client = Arc::new(DataApiClient::from_config(&config.filemaker)?);
    let writer = CaseWriter::new(client.clone(), config);
    let created = writer.create_case(&form).await;
    client.session().end_session().await;
    let case = created?;

    info!(record_id = %case.record_id, "case submitted");
    out.created(&case);

    if notify {
        let dispatcher = NotificationDispatcher::from_config(&config.webhook)?;
        let notice = CaseNotice::created(&form.requester_name, &form.email, &case.record_id);
        out.notified(&dispatcher.notify(&notice).await);
    }

    case.attachment_result()
}

fn read_form(path: &Path) -> Result<CaseForm, PqrsError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PqrsError::validation_field("form", format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&text)
        .map_err(|e| PqrsError::validation_field("form", format!("invalid intake form: {e}")))
}

fn read_upload(path: &Path) -> Result<Upload, PqrsError> {
    let bytes = std::fs::read(path).map_err(|e| {
        PqrsError::validation_field("attachments", format!("cannot read {}: {e}", path.display()))
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "adjunto".to_string());
    Ok(Upload::new(name, bytes))
}
