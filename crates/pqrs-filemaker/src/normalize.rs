// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping between backend field names and the canonical domain types.
//!
//! Layouts in the wild disagree on capitalisation and naming, so each canonical
//! field has an ordered alias list. The first alias with a non-empty value wins.

use chrono::{NaiveDate, NaiveDateTime};
use pqrs_core::{
    AttachmentKind, AttachmentRef, AuditAction, AuditEntry, CaseKind, CaseRecord, CaseStatus,
    Employee, FieldMap, RawRecord, Site,
};
use serde_json::Value;

/// Backend field names on the audit (bitácora) layout.
pub mod audit_fields {
    pub const CASE_ID: &str = "fk_PQRS";
    pub const ACTION: &str = "Accion";
    pub const COMMENT: &str = "Comentario";
    pub const AUTHOR: &str = "fk_EmpleadoAutor";
    pub const PREVIOUS_STATUS: &str = "EstadoPQRSanterior";
    pub const NEW_STATUS: &str = "EstadoPQRSnuevo";
    pub const NEW_ASSIGNEE: &str = "fk_EmpleadoAsignadoNuevo";
}

/// Backend field names on the case layout that the desk writes.
pub mod case_fields {
    pub const STATUS: &str = "Estado";
    pub const ASSIGNED_TO: &str = "Asignado_a";
    pub const ASSIGNED_USER_ID: &str = "Usuario_asignado";
}

/// Employee foreign key to its site.
pub const EMPLOYEE_SITE_FIELD: &str = "fk_Sede";

/// Find criterion matching `value` exactly.
///
/// A bare find value matches every field that begins with it, so `12`
/// would also return `120`.
pub fn exact_match(value: &str) -> String {
    format!("=={value}")
}

const KIND: &[&str] = &["Solicitud", "Tipo_solicitud", "tipo"];
const REQUESTER_NAME: &[&str] = &["Nombre_completo", "nombre"];
const DOCUMENT_TYPE: &[&str] = &["Tipo_documento", "tipoDocumento"];
const DOCUMENT_NUMBER: &[&str] = &["Documento", "documento"];
const EMAIL: &[&str] = &["Correo", "email", "Email"];
const PHONE: &[&str] = &["Telefono_contacto", "telefono"];
const PURCHASE_DATE: &[&str] = &["Fecha_compra", "fechaCompra"];
const INVOICE: &[&str] = &["No_factura", "factura"];
const AREA: &[&str] = &["Area_pqrs", "area"];
const DESCRIPTION: &[&str] = &["Descripcion_pqrs", "descripcion"];
const STATUS: &[&str] = &["Estado", "estado"];
const ASSIGNED_TO: &[&str] = &["Asignado_a", "asignado_a"];
const CASE_CREATED: &[&str] = &[
    "Fecha_creacion",
    "fecha_creacion",
    "CreationTimestamp",
    "Fecha",
    "fecha",
];
const CASE_MODIFIED: &[&str] = &["ModificationTimestamp"];

// Entries are append-only, so the creation stamp is the event time.
const AUDIT_TIMESTAMP: &[&str] = &[
    "CreationTimestamp",
    "FechaCreacion",
    "FechaEvento",
    "ModificationTimestamp",
];
const AUDIT_ACTOR: &[&str] = &["CreatedBy", "ModifiedBy", audit_fields::AUTHOR];
const AUDIT_COMMENT: &[&str] = &[audit_fields::COMMENT, "Comentarios", "Observacion"];

/// Detail fields shown in a history entry, with their display labels.
const AUDIT_DETAILS: &[(&str, &str)] = &[
    (audit_fields::PREVIOUS_STATUS, "Estado anterior"),
    (audit_fields::NEW_STATUS, "Estado nuevo"),
    (audit_fields::AUTHOR, "Empleado autor"),
    (audit_fields::NEW_ASSIGNEE, "Empleado asignado nuevo"),
    ("fk_SedeAnterior", "Sede anterior"),
    ("fk_SedeNueva", "Sede nueva"),
    ("fk_ClaseSolicitudAnterior", "Clase solicitud anterior"),
    ("fk_ClaseSolicitudNuevo", "Clase solicitud nuevo"),
];

const EMPLOYEE_NAME: &[&str] = &["Nombre", "nombre", "Usuario", "usuario"];
const EMPLOYEE_USERNAME: &[&str] = &["Usuario", "usuario"];
const SITE_ID: &[&str] = &["pk_Sede", "id"];
const SITE_NAME: &[&str] = &["Sede", "sede", "Nombre", "nombre"];

/// Fields that may hold container URLs on a case record. Matched case-insensitively.
const ATTACHMENT_FIELDS: &[&str] = &["Adjuntos", "Documentos", "Archivos", "Files", "Attachments"];
const PORTAL_ROW_NAME: &[&str] = &["Nombre", "nombre"];
const PORTAL_ROW_DATE: &[&str] = &["Fecha", "fecha"];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

pub fn case_from_raw(raw: RawRecord) -> CaseRecord {
    let mut fields = raw.field_data;

    let kind = match take(&mut fields, KIND) {
        Some(label) => match CaseKind::parse_loose(&label) {
            Some(kind) => Some(kind),
            None => {
                // Unknown classifications stay visible in `extra`.
                fields.insert(KIND[0].to_string(), Value::String(label));
                None
            }
        },
        None => None,
    };

    CaseRecord {
        record_id: raw.record_id,
        mod_id: raw.mod_id,
        kind,
        requester_name: take(&mut fields, REQUESTER_NAME),
        document_type: take(&mut fields, DOCUMENT_TYPE),
        document_number: take(&mut fields, DOCUMENT_NUMBER),
        email: take(&mut fields, EMAIL),
        phone: take(&mut fields, PHONE),
        purchase_date: take(&mut fields, PURCHASE_DATE),
        invoice_number: take(&mut fields, INVOICE),
        area: take(&mut fields, AREA),
        description: take(&mut fields, DESCRIPTION),
        status: take(&mut fields, STATUS).map(|s| CaseStatus::parse(&s)),
        assigned_to: take(&mut fields, ASSIGNED_TO),
        created_at: take(&mut fields, CASE_CREATED).and_then(|s| parse_timestamp(&s)),
        modified_at: take(&mut fields, CASE_MODIFIED).and_then(|s| parse_timestamp(&s)),
        extra: fields,
    }
}

pub fn audit_from_raw(raw: RawRecord) -> AuditEntry {
    let fields = &raw.field_data;

    let details = AUDIT_DETAILS
        .iter()
        .filter_map(|(key, label)| {
            fields
                .get(*key)
                .and_then(value_text)
                .map(|value| (label.to_string(), value))
        })
        .collect();

    AuditEntry {
        case_id: first(fields, &[audit_fields::CASE_ID]).unwrap_or_default(),
        action: AuditAction::parse(&first(fields, &[audit_fields::ACTION]).unwrap_or_default()),
        comment: first(fields, AUDIT_COMMENT),
        actor: first(fields, AUDIT_ACTOR),
        timestamp: first(fields, AUDIT_TIMESTAMP).and_then(|s| parse_timestamp(&s)),
        details,
        record_id: raw.record_id,
    }
}

pub fn employee_from_raw(raw: RawRecord) -> Employee {
    let fields = &raw.field_data;
    let username = first(fields, EMPLOYEE_USERNAME);
    Employee {
        name: first(fields, EMPLOYEE_NAME).unwrap_or_else(|| raw.record_id.clone()),
        username,
        site_id: first(fields, &[EMPLOYEE_SITE_FIELD]),
        record_id: raw.record_id,
    }
}

pub fn site_from_raw(raw: RawRecord) -> Site {
    let fields = &raw.field_data;
    Site {
        id: first(fields, SITE_ID).unwrap_or_else(|| raw.record_id.clone()),
        name: first(fields, SITE_NAME).unwrap_or_default(),
        record_id: raw.record_id,
    }
}

/// Collects container references from a case record's fields and portals.
pub fn attachments_from_raw(raw: &RawRecord) -> Vec<AttachmentRef> {
    let mut found = Vec::new();

    for (key, value) in &raw.field_data {
        if !ATTACHMENT_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(key)) {
            continue;
        }
        match value {
            Value::String(location) if is_location(location) => {
                found.push(attachment(key.clone(), location, None));
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if let Value::String(location) = item
                        && is_location(location)
                    {
                        found.push(attachment(format!("{key} {}", index + 1), location, None));
                    }
                }
            }
            _ => {}
        }
    }

    for (portal, rows) in &raw.portal_data {
        for (index, row) in rows.iter().enumerate() {
            // Rows are either flat maps or wrap their values in `fieldData`.
            let row = match row.get("fieldData") {
                Some(Value::Object(inner)) => inner,
                _ => row,
            };
            let name = portal_value(row, PORTAL_ROW_NAME)
                .unwrap_or_else(|| format!("{portal} {}", index + 1));
            let date = portal_value(row, PORTAL_ROW_DATE);

            for (key, value) in row {
                if is_field(key, PORTAL_ROW_NAME) || is_field(key, PORTAL_ROW_DATE) {
                    continue;
                }
                if let Value::String(location) = value
                    && is_location(location)
                {
                    found.push(attachment(name.clone(), location, date.clone()));
                }
            }
        }
    }

    found
}

/// An audit entry to append.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditDraft {
    pub case_id: String,
    pub action: AuditAction,
    pub comment: Option<String>,
    pub actor: Option<String>,
    pub previous_status: Option<String>,
    pub new_status: Option<String>,
    pub new_assignee: Option<String>,
}

impl AuditDraft {
    pub fn new(case_id: impl Into<String>, action: AuditAction) -> Self {
        Self {
            case_id: case_id.into(),
            action,
            comment: None,
            actor: None,
            previous_status: None,
            new_status: None,
            new_assignee: None,
        }
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(str::to_string);
        self
    }

    pub fn status_change(mut self, previous: Option<&str>, new: &str) -> Self {
        self.previous_status = previous.map(str::to_string);
        self.new_status = Some(new.to_string());
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.new_assignee = Some(assignee.into());
        self
    }

    /// Backend `fieldData` for this entry. Unset optional fields are omitted.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(audit_fields::CASE_ID.into(), self.case_id.clone().into());
        fields.insert(audit_fields::ACTION.into(), self.action.label().into());

        let optional = [
            (audit_fields::COMMENT, &self.comment),
            (audit_fields::AUTHOR, &self.actor),
            (audit_fields::PREVIOUS_STATUS, &self.previous_status),
            (audit_fields::NEW_STATUS, &self.new_status),
            (audit_fields::NEW_ASSIGNEE, &self.new_assignee),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                fields.insert(key.into(), value.into());
            }
        }
        fields
    }
}

/// Parses the timestamp layouts the backend is known to emit.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Renders a scalar field value, treating blank strings as absent.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first(fields: &FieldMap, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| fields.get(*alias).and_then(value_text))
}

/// Like [`first`], but removes every alias key so leftovers land in `extra`.
fn take(fields: &mut FieldMap, aliases: &[&str]) -> Option<String> {
    let mut found = None;
    for alias in aliases {
        if let Some(value) = fields.remove(*alias)
            && found.is_none()
        {
            found = value_text(&value);
        }
    }
    found
}

/// Portal keys are usually qualified (`Table::Field`), so match on the suffix too.
fn portal_value(row: &FieldMap, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        row.iter()
            .find(|(key, _)| is_field(key, &[*name]))
            .and_then(|(_, value)| value_text(value))
    })
}

fn is_field(key: &str, names: &[&str]) -> bool {
    let bare = key.rsplit("::").next().unwrap_or(key);
    names.contains(&bare)
}

fn is_location(value: &str) -> bool {
    value.contains("http") || value.contains('/')
}

fn attachment(name: String, location: &str, date: Option<String>) -> AttachmentRef {
    AttachmentRef {
        name,
        url: location.to_string(),
        kind: AttachmentKind::from_location(location),
        date,
    }
}
