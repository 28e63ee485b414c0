// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the FileMaker Data API.
//!
//! Provides [`DataApiClient`], which builds layout endpoints, attaches the
//! session token, and renews a rejected session once per call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pqrs_config::model::FileMakerConfig;
use pqrs_core::{
    CreatedRecord, FieldMap, InMemorySessionStore, PqrsError, RawRecord, RecordGateway,
    ScriptOutcome, SessionStore, Upload,
};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use tracing::{debug, error, warn};

use crate::classify::{Classified, ReadMode, classify};
use crate::session::{Credentials, SessionManager};
use crate::wire::{CreatePayload, DataPayload, Envelope, ScriptPayload, UpdatePayload, id_text};

/// Container repetition used for uploads; cases only use single containers.
const CONTAINER_REPETITION: &str = "1";

/// Data API client bound to one database and one identity.
pub struct DataApiClient {
    http: reqwest::Client,
    database_url: Url,
    session: SessionManager,
}

impl DataApiClient {
    /// Builds a client for the configured service account with its own session store.
    pub fn from_config(config: &FileMakerConfig) -> Result<Self, PqrsError> {
        let credentials = match (config.username.as_deref(), config.password.as_deref()) {
            (Some(user), Some(password)) => Some(Credentials::new(user, password)),
            _ => None,
        };
        Self::with_store(config, credentials, Arc::new(InMemorySessionStore::new()))
    }

    /// Builds a client for an explicit identity and session store.
    pub fn with_store(
        config: &FileMakerConfig,
        credentials: Option<Credentials>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, PqrsError> {
        let base_url = required(config.base_url.as_deref(), "filemaker.base_url")?;
        let database = required(config.database.as_deref(), "filemaker.database")?;

        let mut database_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| PqrsError::Config(format!("invalid filemaker.base_url: {e}")))?;
        database_url
            .path_segments_mut()
            .map_err(|_| PqrsError::Config("filemaker.base_url cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(["fmi", "data", "v1", "databases", database]);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PqrsError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let sessions_url = extend(&database_url, &["sessions"]);
        let session = SessionManager::new(http.clone(), sessions_url, credentials, store);

        Ok(Self {
            http,
            database_url,
            session,
        })
    }

    /// Signs an employee in and returns a client bound to their own session.
    ///
    /// Any rejection is reported as "invalid username or password".
    pub async fn sign_in(
        config: &FileMakerConfig,
        username: &str,
        password: &str,
    ) -> Result<Self, PqrsError> {
        let client = Self::with_store(
            config,
            Some(Credentials::new(username, password)),
            Arc::new(InMemorySessionStore::new()),
        )?;
        client.session.acquire().await.map_err(|e| match e {
            PqrsError::Authentication(_) => {
                PqrsError::Authentication("invalid username or password".into())
            }
            other => other,
        })?;
        Ok(client)
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Downloads container content from a URL returned in a record.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, PqrsError> {
        let url = Url::parse(url)
            .map_err(|e| PqrsError::rejected(format!("invalid container URL: {e}")))?;

        for attempt in 0..2u8 {
            let token = self.session.acquire().await?;
            let response = self
                .http
                .get(url.clone())
                .bearer_auth(token.expose())
                .send()
                .await
                .map_err(transport("download"))?;
            let status = response.status();
            debug!(status = %status, attempt, "container download response");

            match status {
                StatusCode::UNAUTHORIZED => {
                    self.session.invalidate();
                    continue;
                }
                StatusCode::NOT_FOUND => {
                    return Err(PqrsError::NotFound("container content not found".into()));
                }
                s if s.is_success() => {
                    let bytes = response.bytes().await.map_err(transport("download"))?;
                    return Ok(bytes.to_vec());
                }
                s => {
                    return Err(PqrsError::rejected(format!(
                        "container download failed (HTTP {s})"
                    )));
                }
            }
        }

        Err(PqrsError::SessionExpired)
    }

    fn layout_url(&self, layout: &str, rest: &[&str]) -> Url {
        let mut segments = vec!["layouts", layout];
        segments.extend_from_slice(rest);
        extend(&self.database_url, &segments)
    }

    /// Sends a request, renewing the session and retrying once on an auth failure.
    ///
    /// `build` is called once per attempt with the current token.
    async fn send<F>(&self, op: &'static str, mode: ReadMode, build: F) -> Result<Envelope, PqrsError>
    where
        F: Fn(&str) -> Result<reqwest::RequestBuilder, PqrsError> + Send + Sync,
    {
        for attempt in 0..2u8 {
            let token = self.session.acquire().await?;
            let response = build(token.expose())?
                .send()
                .await
                .map_err(transport(op))?;
            let status = response.status();
            let body = response.text().await.map_err(transport(op))?;
            debug!(op, status = %status, attempt, "data api response received");

            match classify(status, &body, mode) {
                Classified::Success(envelope) => return Ok(envelope),
                Classified::Failure(err) => return Err(err),
                Classified::AuthFailure => {
                    self.session.invalidate();
                    if attempt == 0 {
                        warn!(op, "session rejected, reauthenticating and retrying once");
                    }
                }
            }
        }

        error!(op, "session rejected again after reauthentication");
        Err(PqrsError::SessionExpired)
    }
}

#[async_trait]
impl RecordGateway for DataApiClient {
    async fn list(&self, layout: &str, limit: u32) -> Result<Vec<RawRecord>, PqrsError> {
        let url = self.layout_url(layout, &["records"]);
        let limit = limit.to_string();
        let envelope = self
            .send("list", ReadMode { no_match_is_empty: true }, |token| {
                Ok(self
                    .http
                    .get(url.clone())
                    .query(&[("_limit", limit.as_str())])
                    .bearer_auth(token))
            })
            .await?;
        Ok(parse::<DataPayload>(&envelope)?.data)
    }

    async fn get(&self, layout: &str, record_id: &str) -> Result<RawRecord, PqrsError> {
        let url = self.layout_url(layout, &["records", record_id]);
        let envelope = self
            .send("get", ReadMode::default(), |token| {
                Ok(self.http.get(url.clone()).bearer_auth(token))
            })
            .await?;
        parse::<DataPayload>(&envelope)?
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PqrsError::NotFound(format!("record {record_id} not found")))
    }

    async fn find(
        &self,
        layout: &str,
        query: Vec<FieldMap>,
        limit: Option<u32>,
    ) -> Result<Vec<RawRecord>, PqrsError> {
        let url = self.layout_url(layout, &["_find"]);
        let mut body = serde_json::json!({ "query": query });
        if let Some(limit) = limit {
            body["limit"] = serde_json::Value::from(limit);
        }
        let envelope = self
            .send("find", ReadMode { no_match_is_empty: true }, |token| {
                Ok(self.http.post(url.clone()).json(&body).bearer_auth(token))
            })
            .await?;
        Ok(parse::<DataPayload>(&envelope)?.data)
    }

    async fn create(&self, layout: &str, fields: FieldMap) -> Result<CreatedRecord, PqrsError> {
        let url = self.layout_url(layout, &["records"]);
        let body = serde_json::json!({ "fieldData": fields });
        let envelope = self
            .send("create", ReadMode::default(), |token| {
                Ok(self.http.post(url.clone()).json(&body).bearer_auth(token))
            })
            .await
            .map_err(|e| match e {
                PqrsError::SessionExpired => PqrsError::AuthExpiredDuringWrite,
                other => other,
            })?;

        let payload = parse::<CreatePayload>(&envelope)?;
        let record_id = payload
            .record_id
            .as_ref()
            .and_then(id_text)
            .ok_or_else(|| PqrsError::rejected("backend did not return a record id"))?;
        Ok(CreatedRecord {
            record_id,
            mod_id: payload.mod_id.as_ref().and_then(id_text),
        })
    }

    async fn update(
        &self,
        layout: &str,
        record_id: &str,
        fields: FieldMap,
    ) -> Result<String, PqrsError> {
        let url = self.layout_url(layout, &["records", record_id]);
        let body = serde_json::json!({ "fieldData": fields });
        let envelope = self
            .send("update", ReadMode::default(), |token| {
                Ok(self.http.patch(url.clone()).json(&body).bearer_auth(token))
            })
            .await?;
        parse::<UpdatePayload>(&envelope)?
            .mod_id
            .as_ref()
            .and_then(id_text)
            .ok_or_else(|| PqrsError::rejected("backend did not acknowledge the update"))
    }

    async fn upload_container(
        &self,
        layout: &str,
        record_id: &str,
        field: &str,
        file: &Upload,
    ) -> Result<(), PqrsError> {
        let url = self.layout_url(
            layout,
            &["records", record_id, "containers", field, CONTAINER_REPETITION],
        );
        self.send("upload", ReadMode::default(), |token| {
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| {
                    PqrsError::validation_field("file", format!("invalid content type: {e}"))
                })?;
            let form = reqwest::multipart::Form::new().part("upload", part);
            Ok(self.http.post(url.clone()).multipart(form).bearer_auth(token))
        })
        .await?;
        debug!(layout, record_id, field, size = file.size(), "container uploaded");
        Ok(())
    }

    async fn run_script(
        &self,
        layout: &str,
        script: &str,
        param: Option<&str>,
    ) -> Result<ScriptOutcome, PqrsError> {
        let url = self.layout_url(layout, &["script", script]);
        let envelope = self
            .send("script", ReadMode::default(), |token| {
                let mut request = self.http.get(url.clone()).bearer_auth(token);
                if let Some(param) = param {
                    request = request.query(&[("script.param", param)]);
                }
                Ok(request)
            })
            .await?;
        let payload = parse::<ScriptPayload>(&envelope)?;
        Ok(ScriptOutcome {
            error_code: payload.script_error.as_ref().and_then(id_text),
            result: payload.script_result,
        })
    }

    fn invalidate_session(&self) {
        self.session.invalidate();
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, PqrsError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PqrsError::Config(format!("{key} is not configured")))
}

/// Appends percent-encoded path segments to a base URL.
fn extend(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.extend(segments);
    }
    url
}

fn parse<T: serde::de::DeserializeOwned + Default>(envelope: &Envelope) -> Result<T, PqrsError> {
    envelope
        .payload()
        .map_err(|e| PqrsError::Internal(format!("unexpected Data API payload: {e}")))
}

fn transport(op: &'static str) -> impl Fn(reqwest::Error) -> PqrsError {
    move |e| PqrsError::Http {
        message: format!("{op} request failed: {e}"),
        source: Some(Box::new(e)),
    }
}
