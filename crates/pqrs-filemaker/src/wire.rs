// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data API response envelope and payload shapes.
//!
//! Every response has the form `{"response": {...}, "messages": [{"code", "message"}]}`.
//! Code `"0"` means success.

use pqrs_core::RawRecord;
use serde::Deserialize;

/// Top-level response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub response: serde_json::Value,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
}

impl Envelope {
    /// Text of the first message carrying a non-empty description.
    pub fn first_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .map(|m| m.message.trim())
            .find(|m| !m.is_empty() && !m.eq_ignore_ascii_case("OK"))
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.messages.iter().any(|m| m.code == code)
    }

    /// True when every message reports code `"0"` (or there are none).
    pub fn is_ok(&self) -> bool {
        self.messages.iter().all(|m| m.code == "0")
    }

    /// Deserializes `response` into a payload type.
    pub fn payload<T: serde::de::DeserializeOwned + Default>(&self) -> Result<T, serde_json::Error> {
        if self.response.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.response.clone())
    }
}

/// One entry of `messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default, deserialize_with = "code_as_string")]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

fn code_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
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

/// `POST /sessions` payload.
#[derive(Debug, Default, Deserialize)]
pub struct SessionPayload {
    #[serde(default)]
    pub token: Option<String>,
}

/// Payload of list, get, and `_find`.
#[derive(Debug, Default, Deserialize)]
pub struct DataPayload {
    #[serde(default)]
    pub data: Vec<RawRecord>,
}

/// `POST /records` payload.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePayload {
    #[serde(rename = "recordId", default)]
    pub record_id: Option<serde_json::Value>,
    #[serde(rename = "modId", default)]
    pub mod_id: Option<serde_json::Value>,
}

/// `PATCH /records/{id}` payload.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePayload {
    #[serde(rename = "modId", default)]
    pub mod_id: Option<serde_json::Value>,
}

/// `GET /script/{name}` payload.
#[derive(Debug, Default, Deserialize)]
pub struct ScriptPayload {
    #[serde(rename = "scriptError", default)]
    pub script_error: Option<serde_json::Value>,
    #[serde(rename = "scriptResult", default)]
    pub script_result: Option<String>,
}

/// Renders an identifier that may arrive as a JSON string or number.
pub fn id_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
