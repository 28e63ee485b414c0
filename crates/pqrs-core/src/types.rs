// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the gateway, orchestrator, and desk crates.
//!
//! [`RawRecord`] is the backend's record shape. Everything else is canonical:
//! backend field-name variations are resolved once by the normalizer in
//! `pqrs-filemaker` and never leak past it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

/// A backend field mapping (`fieldData`, `_find` predicates, update payloads).
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Opaque session credential. The value is never printed.
#[derive(Clone)]
pub struct SessionToken(Arc<SecretString>);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(token.into())))
    }

    /// Returns the raw token for use in a request header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([redacted])")
    }
}

/// A record exactly as the Data API returns it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(rename = "recordId", default, deserialize_with = "de_stringish")]
    pub record_id: String,
    #[serde(rename = "modId", default, deserialize_with = "de_stringish")]
    pub mod_id: String,
    #[serde(rename = "fieldData", default)]
    pub field_data: FieldMap,
    #[serde(rename = "portalData", default)]
    pub portal_data: BTreeMap<String, Vec<FieldMap>>,
}

/// Accepts `"12"`, `12`, or `null` for identifier fields.
fn de_stringish<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Result of a successful create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRecord {
    pub record_id: String,
    pub mod_id: Option<String>,
}

/// Result of a script trigger call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutcome {
    /// `scriptError` as reported by the backend; `"0"` means success.
    pub error_code: Option<String>,
    pub result: Option<String>,
}

impl ScriptOutcome {
    pub fn succeeded(&self) -> bool {
        self.error_code.as_deref().is_none_or(|code| code == "0")
    }
}

/// A file to be stored in a container field.
#[derive(Clone)]
pub struct Upload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Creates an upload, guessing the content type from the file name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .to_string();
        Self {
            name,
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// PQRS classification. Codes are the lowercase form used by intake forms.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    Peticion,
    Queja,
    Reclamo,
    Sugerencia,
    Felicitacion,
}

impl CaseKind {
    /// Display label stored in the backend's `Solicitud` field.
    pub fn label(self) -> &'static str {
        match self {
            Self::Peticion => "Petición",
            Self::Queja => "Queja",
            Self::Reclamo => "Reclamo",
            Self::Sugerencia => "Sugerencia",
            Self::Felicitacion => "Felicitación",
        }
    }

    /// Parses either a code (`queja`) or a label (`Queja`, `Petición`, `Peticion`).
    pub fn parse_loose(input: &str) -> Option<Self> {
        let folded = fold_accents(input.trim());
        folded.parse().ok()
    }
}

/// Workflow status of a case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaseStatus {
    Pending,
    InProgress,
    Resolved,
    Closed,
    Expired,
    Other(String),
}

impl CaseStatus {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "pendiente" => Self::Pending,
            "en proceso" => Self::InProgress,
            "resuelta" => Self::Resolved,
            "cerrada" => Self::Closed,
            "expirada" => Self::Expired,
            _ => Self::Other(input.trim().to_string()),
        }
    }

    /// Backend label (`Estado` field value).
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En Proceso",
            Self::Resolved => "Resuelta",
            Self::Closed => "Cerrada",
            Self::Expired => "Expirada",
            Self::Other(label) => label,
        }
    }

    /// Label shown to the requester; internal states are collapsed.
    pub fn public_label(&self) -> &str {
        match self {
            Self::Pending | Self::InProgress => "en gestion",
            Self::Closed | Self::Expired => "cerrada",
            other => other.label(),
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CaseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Canonical case record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseRecord {
    /// Backend identifier, shown to requesters as the radicado.
    pub record_id: String,
    pub mod_id: String,
    pub kind: Option<CaseKind>,
    pub requester_name: Option<String>,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub purchase_date: Option<String>,
    pub invoice_number: Option<String>,
    pub area: Option<String>,
    pub description: Option<String>,
    pub status: Option<CaseStatus>,
    pub assigned_to: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
    /// Backend fields with no canonical slot, kept verbatim.
    pub extra: FieldMap,
}

impl CaseRecord {
    pub fn is_unassigned(&self) -> bool {
        self.assigned_to.as_deref().is_none_or(|a| a.trim().is_empty())
    }
}

/// Audit (bitácora) action tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuditAction {
    Created,
    Comment,
    Attachment,
    StatusChange,
    Reassignment,
    Other(String),
}

impl AuditAction {
    /// Value written to the audit layout's `Accion` field.
    pub fn label(&self) -> &str {
        match self {
            Self::Created => "CREADA",
            Self::Comment => "COMENTARIO",
            Self::Attachment => "ADJUNTO",
            Self::StatusChange => "CAMBIO_ESTADO",
            Self::Reassignment => "REASIGNACION",
            Self::Other(label) => label,
        }
    }

    pub fn parse(input: &str) -> Self {
        match input.trim().to_uppercase().as_str() {
            "CREADA" => Self::Created,
            "COMENTARIO" => Self::Comment,
            "ADJUNTO" => Self::Attachment,
            "CAMBIO_ESTADO" => Self::StatusChange,
            "REASIGNACION" => Self::Reassignment,
            "" => Self::Other("Cambio".to_string()),
            _ => Self::Other(input.trim().to_string()),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AuditAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One append-only bitácora entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub record_id: String,
    /// The case this entry belongs to (`fk_PQRS`).
    pub case_id: String,
    pub action: AuditAction,
    pub comment: Option<String>,
    pub actor: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    /// Human-readable change details (previous/new status, assignee, site...).
    pub details: BTreeMap<String, String>,
}

/// Coarse attachment type, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Pdf,
    Image,
    File,
}

impl AttachmentKind {
    pub fn from_location(location: &str) -> Self {
        let lower = location.to_lowercase();
        if lower.contains(".pdf") {
            Self::Pdf
        } else if [".jpg", ".jpeg", ".png", ".gif", ".webp"]
            .iter()
            .any(|ext| lower.contains(ext))
        {
            Self::Image
        } else {
            Self::File
        }
    }
}

/// A resolvable reference to stored attachment content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentRef {
    pub name: String,
    pub url: String,
    pub kind: AttachmentKind,
    pub date: Option<String>,
}

/// An employee that cases can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    pub record_id: String,
    pub name: String,
    pub username: Option<String>,
    pub site_id: Option<String>,
}

/// A branch/site grouping employees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    pub record_id: String,
    /// Primary key used by employee records (`pk_Sede`).
    pub id: String,
    pub name: String,
}

/// Lowercases and strips Spanish diacritics so labels compare against codes.
fn fold_accents(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' | 'ü' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
