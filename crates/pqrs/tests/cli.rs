// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the `pqrs` binary against a mock Data API.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use pqrs_test_utils::data_api::{self, DB_PATH};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let path = dir.join("pqrs.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[filemaker]
base_url = "{base_url}"
database = "PQRS"
username = "svc"
password = "secret"

[retry]
base_delay_ms = 0
max_delay_ms = 0
"#
        ),
    )
    .unwrap();
    path
}

async fn pqrs(config: &Path, args: &[&str], desk_user: Option<(&str, &str)>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pqrs"));
    command
        .arg("--config")
        .arg(config)
        .arg("--plain")
        .args(args)
        .stdin(Stdio::null())
        .env_remove("RUST_LOG")
        .env_remove("DESK_USER")
        .env_remove("DESK_PASSWORD");
    if let Some((user, password)) = desk_user {
        command.env("DESK_USER", user).env("DESK_PASSWORD", password);
    }
    tokio::task::spawn_blocking(move || command.output().unwrap())
        .await
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

async fn mount_logout(server: &MockServer, token: &str) {
    Mock::given(method("DELETE"))
        .and(path(format!("{DB_PATH}/sessions/{token}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(data_api::ok(json!({}))))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn check_passes_against_reachable_backend() {
    let server = MockServer::start().await;
    data_api::mount_session(&server, "tok").await;
    mount_logout(&server, "tok").await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = pqrs(&config, &["check"], None).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("signed in as svc"));
}

#[tokio::test(flavor = "multi_thread")]
async fn check_fails_when_credentials_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DB_PATH}/sessions")))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(data_api::error_body("212", "Invalid user account")),
        )
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = pqrs(&config, &["check"], None).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("[FAIL]"));
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_config_is_reported_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "fms.example.com");

    let output = pqrs(&config, &["check"], None).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("filemaker.base_url"));
}

#[tokio::test(flavor = "multi_thread")]
async fn desk_command_without_credentials_does_not_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    let output = pqrs(&config, &["get", "12"], None).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("DESK_USER"));
}

#[tokio::test(flavor = "multi_thread")]
async fn get_signs_employee_in_and_out() {
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
            "data": [data_api::record_json("12", "3", json!({
                "Solicitud": "Reclamo",
                "Estado": "Pendiente",
                "Nombre": "Ana Ruiz"
            }))]
        }))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DB_PATH}/sessions/emp")))
        .respond_with(ResponseTemplate::new(200).set_body_json(data_api::ok(json!({}))))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = pqrs(&config, &["get", "12"], Some(("ana", "pw"))).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Radicado 12"));
    assert!(text.contains("Pendiente"));
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_session_exits_with_relogin_message() {
    let server = MockServer::start().await;
    data_api::mount_session(&server, "emp").await;
    Mock::given(method("GET"))
        .and(path(format!("{DB_PATH}/layouts/PQRS/records/12")))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_logout(&server, "emp").await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = pqrs(&config, &["get", "12"], Some(("ana", "pw"))).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("sign in again"));
}
