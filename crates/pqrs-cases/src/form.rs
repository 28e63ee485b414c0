// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intake form validation and mapping to backend fields.

use chrono::NaiveDate;
use pqrs_core::{CaseKind, FieldMap, PqrsError, Upload};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Stored in `Politica_datos` when the requester accepts the data policy.
pub const CONSENT_ACCEPTED: &str = r#"["Acepto"]"#;

/// Backend fields sent on every create, even when empty.
pub const MANDATORY_BACKEND_FIELDS: &[&str] = &[
    "Solicitud",
    "Nombre_completo",
    "Tipo_documento",
    "Documento",
    "Correo",
    "Telefono_contacto",
    "Descripcion_pqrs",
    "Politica_datos",
];

/// Area codes used by intake forms and their backend labels.
const AREA_LABELS: &[(&str, &str)] = &[
    ("servicio_cliente", "Servicio al cliente"),
    ("garantia", "Garantía"),
    ("cambio_devolucion", "Cambio o devolución"),
];

/// A requester's intake submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaseForm {
    /// Classification code (`queja`) or label (`Queja`).
    pub kind: String,
    pub requester_name: String,
    pub document_type: String,
    pub document_number: String,
    pub email: String,
    pub phone: String,
    /// ISO `YYYY-MM-DD`.
    pub purchase_date: String,
    pub invoice_number: String,
    /// Area code such as `garantia`.
    pub area: String,
    pub description: String,
    pub data_consent: bool,
    #[serde(skip)]
    pub attachments: Vec<Upload>,
}

impl CaseForm {
    /// Checks mandatory fields in form order and reports the first missing one.
    pub fn validate(&self) -> Result<(), PqrsError> {
        let required = [
            ("kind", &self.kind, "classification is required"),
            ("requester_name", &self.requester_name, "full name is required"),
            ("document_number", &self.document_number, "document number is required"),
            ("email", &self.email, "email is required"),
            ("phone", &self.phone, "contact phone is required"),
            ("description", &self.description, "description is required"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                return Err(PqrsError::validation_field(field, message));
            }
        }
        if !self.data_consent {
            return Err(PqrsError::validation_field(
                "data_consent",
                "the data processing policy must be accepted",
            ));
        }
        Ok(())
    }

    /// Maps the form to the case layout's `fieldData`.
    ///
    /// Mandatory backend fields are always present. Empty optional fields are omitted.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("Solicitud".into(), kind_label(&self.kind).into());
        fields.insert("Nombre_completo".into(), self.requester_name.trim().into());
        fields.insert("Tipo_documento".into(), self.document_type.trim().into());
        fields.insert("Documento".into(), numeric_or_text(&self.document_number));
        fields.insert("Correo".into(), self.email.trim().into());
        fields.insert("Telefono_contacto".into(), numeric_or_text(&self.phone));
        fields.insert("Descripcion_pqrs".into(), self.description.trim().into());
        fields.insert(
            "Politica_datos".into(),
            if self.data_consent { CONSENT_ACCEPTED } else { "" }.into(),
        );

        let optional = [
            ("Fecha_compra", format_purchase_date(&self.purchase_date)),
            ("No_factura", self.invoice_number.trim().to_string()),
            ("Area_pqrs", area_label(&self.area)),
        ];
        for (key, value) in optional {
            if !value.is_empty() {
                fields.insert(key.into(), value.into());
            }
        }
        fields
    }
}

/// Backend label for a classification; unknown values pass through.
pub fn kind_label(kind: &str) -> String {
    match CaseKind::parse_loose(kind) {
        Some(kind) => kind.label().to_string(),
        None => kind.trim().to_string(),
    }
}

/// Backend label for an area code; unknown values pass through.
pub fn area_label(area: &str) -> String {
    let area = area.trim();
    AREA_LABELS
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(area))
        .map_or_else(|| area.to_string(), |(_, label)| label.to_string())
}

/// `YYYY-MM-DD` becomes `MM/DD/YYYY`; anything else is sent as given.
pub fn format_purchase_date(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => date.format("%m/%d/%Y").to_string(),
        Err(_) => {
            warn!(input, "purchase date is not ISO formatted, sending as given");
            input.to_string()
        }
    }
}

/// All-digit identifiers go out as numbers, except where a leading zero would be lost.
fn numeric_or_text(input: &str) -> Value {
    let input = input.trim();
    let all_digits = !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit());
    let keeps_zeros = input == "0" || !input.starts_with('0');
    if all_digits && keeps_zeros
        && let Ok(number) = input.parse::<u64>()
    {
        return Value::from(number);
    }
    Value::String(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_form() -> CaseForm {
        CaseForm {
            kind: "queja".into(),
            requester_name: "Ana Ruiz".into(),
            document_type: "CC".into(),
            document_number: "1020304050".into(),
            email: "ana@example.com".into(),
            phone: "3001234567".into(),
            description: "El producto llegó dañado".into(),
            data_consent: true,
            ..CaseForm::default()
        }
    }

    #[test]
    fn complete_form_validates() {
        assert!(complete_form().validate().is_ok());
    }

    #[test]
    fn first_missing_field_is_reported_in_form_order() {
        let mut form = complete_form();
        form.email = "  ".into();
        form.description.clear();
        assert_eq!(form.validate().unwrap_err().field(), Some("email"));

        let empty = CaseForm::default();
        assert_eq!(empty.validate().unwrap_err().field(), Some("kind"));

        let mut no_consent = complete_form();
        no_consent.data_consent = false;
        assert_eq!(no_consent.validate().unwrap_err().field(), Some("data_consent"));
    }

    #[test]
    fn mapping_uses_backend_labels_and_numbers() {
        let mut form = complete_form();
        form.area = "garantia".into();
        form.purchase_date = "2026-01-05".into();
        let fields = form.to_fields();
        assert_eq!(fields["Solicitud"], json!("Queja"));
        assert_eq!(fields["Documento"], json!(1020304050u64));
        assert_eq!(fields["Telefono_contacto"], json!(3001234567u64));
        assert_eq!(fields["Area_pqrs"], json!("Garantía"));
        assert_eq!(fields["Fecha_compra"], json!("01/05/2026"));
        assert_eq!(fields["Politica_datos"], json!(CONSENT_ACCEPTED));
    }

    #[test]
    fn empty_optionals_are_omitted_but_mandatory_fields_stay() {
        let mut form = complete_form();
        form.document_type.clear();
        let fields = form.to_fields();
        for key in MANDATORY_BACKEND_FIELDS {
            assert!(fields.contains_key(*key), "missing {key}");
        }
        assert_eq!(fields["Tipo_documento"], json!(""));
        assert!(!fields.contains_key("Fecha_compra"));
        assert!(!fields.contains_key("No_factura"));
        assert!(!fields.contains_key("Area_pqrs"));
    }

    #[test]
    fn identifiers_with_leading_zero_or_symbols_stay_text() {
        assert_eq!(numeric_or_text("0123"), json!("0123"));
        assert_eq!(numeric_or_text("+57 300"), json!("+57 300"));
        assert_eq!(numeric_or_text("0"), json!(0));
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(kind_label("Felicitación"), "Felicitación");
        assert_eq!(kind_label("denuncia"), "denuncia");
        assert_eq!(area_label("logistica"), "logistica");
        assert_eq!(area_label("CAMBIO_DEVOLUCION"), "Cambio o devolución");
        assert_eq!(format_purchase_date("15/01/2026"), "15/01/2026");
    }
}
