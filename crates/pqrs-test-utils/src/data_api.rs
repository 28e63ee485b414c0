// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data API fixtures for `wiremock` based tests.

use pqrs_config::model::{FileMakerConfig, PqrsConfig};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Database path used by [`filemaker_config`].
pub const DB_PATH: &str = "/fmi/data/v1/databases/PQRS";

/// Backend settings pointing at a mock server, service account `svc:secret`.
pub fn filemaker_config(uri: &str) -> FileMakerConfig {
    FileMakerConfig {
        base_url: Some(uri.to_string()),
        database: Some("PQRS".to_string()),
        username: Some("svc".to_string()),
        password: Some("secret".to_string()),
        ..FileMakerConfig::default()
    }
}

/// Full configuration pointing at a mock server, with zero-delay retries.
pub fn pqrs_config(uri: &str) -> PqrsConfig {
    let mut config = PqrsConfig {
        filemaker: filemaker_config(uri),
        ..PqrsConfig::default()
    };
    config.retry.base_delay_ms = 0;
    config.retry.max_delay_ms = 0;
    config
}

/// Successful envelope around `response`.
pub fn ok(response: Value) -> Value {
    json!({
        "response": response,
        "messages": [{"code": "0", "message": "OK"}]
    })
}

/// Failure envelope with one message.
pub fn error_body(code: &str, message: &str) -> Value {
    json!({
        "response": {},
        "messages": [{"code": code, "message": message}]
    })
}

pub fn token_body(token: &str) -> Value {
    ok(json!({ "token": token }))
}

/// One entry of a `data` array.
pub fn record_json(record_id: &str, mod_id: &str, fields: Value) -> Value {
    json!({
        "recordId": record_id,
        "modId": mod_id,
        "fieldData": fields,
        "portalData": {}
    })
}

/// Session endpoint that hands out `token` on every exchange.
pub async fn mount_session(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(format!("{DB_PATH}/sessions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token)))
        .mount(server)
        .await;
}

/// Session endpoint that hands out each token exactly once, in order.
pub async fn mount_session_sequence(server: &MockServer, tokens: &[&str]) {
    for token in tokens {
        Mock::given(method("POST"))
            .and(path(format!("{DB_PATH}/sessions")))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token)))
            .up_to_n_times(1)
            .expect(1)
            .mount(server)
            .await;
    }
}
