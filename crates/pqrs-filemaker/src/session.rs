// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session acquisition, caching, and invalidation.

use std::sync::Arc;

use pqrs_core::{PqrsError, SessionStore, SessionToken};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::wire::{Envelope, SessionPayload};

/// Identity and secret exchanged for a session token.
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Acquires and caches a session credential for one identity.
///
/// A cached token is trusted until a consumer reports it rejected through
/// [`SessionManager::invalidate`]; no expiry is predicted locally.
pub struct SessionManager {
    http: reqwest::Client,
    sessions_url: reqwest::Url,
    credentials: Option<Credentials>,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(
        http: reqwest::Client,
        sessions_url: reqwest::Url,
        credentials: Option<Credentials>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            http,
            sessions_url,
            credentials,
            store,
        }
    }

    /// Returns the cached token, or exchanges the credentials for a new one.
    ///
    /// Never retries: a rejected exchange is an [`PqrsError::Authentication`].
    pub async fn acquire(&self) -> Result<SessionToken, PqrsError> {
        if let Some(token) = self.store.get() {
            return Ok(token);
        }

        let credentials = self
            .credentials
            .as_ref()
            .filter(|c| c.is_complete())
            .ok_or_else(|| {
                PqrsError::Config(
                    "FileMaker credentials are not configured (filemaker.username / filemaker.password)"
                        .into(),
                )
            })?;

        let token = self.exchange(credentials).await?;
        self.store.set(token.clone());
        info!(user = %credentials.username, "FileMaker session acquired");
        Ok(token)
    }

    /// Clears the cached token. Idempotent.
    pub fn invalidate(&self) {
        self.store.clear();
        debug!("FileMaker session invalidated");
    }

    /// Logs the session out on the server (best effort) and clears the cache.
    pub async fn end_session(&self) {
        let Some(token) = self.store.get() else {
            return;
        };
        self.invalidate();
        self.logout(&token).await;
    }

    async fn logout(&self, token: &SessionToken) {
        let mut url = self.sessions_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(token.expose());
        }
        match self.http.delete(url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("FileMaker session closed");
            }
            Ok(response) => {
                warn!(status = %response.status(), "FileMaker session logout rejected");
            }
            Err(e) => warn!(error = %e, "FileMaker session logout failed"),
        }
    }

    /// Checks another identity's credentials without touching the cache.
    ///
    /// The probe session is logged out again right away.
    pub async fn verify(&self, username: &str, password: &str) -> Result<(), PqrsError> {
        let credentials = Credentials::new(username, password);
        if !credentials.is_complete() {
            return Err(PqrsError::validation_field(
                "username",
                "username and password are required",
            ));
        }
        let token = self.exchange(&credentials).await.map_err(|e| match e {
            PqrsError::Authentication(_) => {
                PqrsError::Authentication("invalid username or password".into())
            }
            other => other,
        })?;
        self.logout(&token).await;
        Ok(())
    }

    /// The identity this manager signs in as, if configured.
    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<SessionToken, PqrsError> {
        let response = self
            .http
            .post(self.sessions_url.clone())
            .basic_auth(
                &credentials.username,
                Some(credentials.password.expose_secret()),
            )
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| PqrsError::Http {
                message: format!("session request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, "session response received");

        let envelope: Envelope = serde_json::from_str(&body).unwrap_or_default();
        let token = envelope
            .payload::<SessionPayload>()
            .ok()
            .and_then(|p| p.token)
            .filter(|t| !t.is_empty());

        match token {
            Some(token) if status.is_success() => Ok(SessionToken::new(token)),
            _ => Err(PqrsError::Authentication(
                envelope
                    .first_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {status}")),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqrs_core::InMemorySessionStore;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager(server: &MockServer, credentials: Option<Credentials>) -> SessionManager {
        let url = reqwest::Url::parse(&format!(
            "{}/fmi/data/v1/databases/PQRS/sessions",
            server.uri()
        ))
        .unwrap();
        SessionManager::new(
            reqwest::Client::new(),
            url,
            credentials,
            Arc::new(InMemorySessionStore::new()),
        )
    }

    fn token_body(token: &str) -> serde_json::Value {
        serde_json::json!({
            "response": {"token": token},
            "messages": [{"code": "0", "message": "OK"}]
        })
    }

    #[tokio::test]
    async fn acquire_exchanges_basic_auth_once_then_caches() {
        let server = MockServer::start().await;
        // "svc:secret" in base64.
        Mock::given(method("POST"))
            .and(path("/fmi/data/v1/databases/PQRS/sessions"))
            .and(header("authorization", "Basic c3ZjOnNlY3JldA=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1")))
            .expect(1)
            .mount(&server)
            .await;

        let sessions = manager(&server, Some(Credentials::new("svc", "secret")));
        let first = sessions.acquire().await.unwrap();
        let second = sessions.acquire().await.unwrap();
        assert_eq!(first.expose(), "tok-1");
        assert_eq!(second.expose(), "tok-1");
    }

    #[tokio::test]
    async fn missing_credentials_is_config_error_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("x")))
            .expect(0)
            .mount(&server)
            .await;

        let none = manager(&server, None);
        assert!(matches!(none.acquire().await, Err(PqrsError::Config(_))));

        let blank = manager(&server, Some(Credentials::new("svc", "")));
        assert!(matches!(blank.acquire().await, Err(PqrsError::Config(_))));
    }

    #[tokio::test]
    async fn rejected_exchange_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "response": {},
                "messages": [{"code": "212", "message": "Invalid user account and/or password; please try again"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sessions = manager(&server, Some(Credentials::new("svc", "wrong")));
        match sessions.acquire().await {
            Err(PqrsError::Authentication(message)) => {
                assert!(message.contains("Invalid user account"), "got {message}");
            }
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalidate_forces_new_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok")))
            .expect(2)
            .mount(&server)
            .await;

        let sessions = manager(&server, Some(Credentials::new("svc", "secret")));
        sessions.acquire().await.unwrap();
        sessions.invalidate();
        sessions.invalidate();
        sessions.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn end_session_deletes_token_on_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-9")))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/fmi/data/v1/databases/PQRS/sessions/tok-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {}, "messages": [{"code": "0", "message": "OK"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sessions = manager(&server, Some(Credentials::new("svc", "secret")));
        sessions.acquire().await.unwrap();
        sessions.end_session().await;
        // Nothing cached, so a second logout is a no-op.
        sessions.end_session().await;
    }

    #[tokio::test]
    async fn verify_checks_other_identity_without_caching() {
        let server = MockServer::start().await;
        // "ana:pw" in base64.
        Mock::given(method("POST"))
            .and(header("authorization", "Basic YW5hOnB3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("probe")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("authorization", "Basic YW5hOmJhZA=="))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/fmi/data/v1/databases/PQRS/sessions/probe"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sessions = manager(&server, None);
        sessions.verify("ana", "pw").await.unwrap();
        assert!(matches!(
            sessions.verify("ana", "bad").await,
            Err(PqrsError::Authentication(message)) if message == "invalid username or password"
        ));
        // The service identity is still unconfigured, so nothing was cached.
        assert!(matches!(sessions.acquire().await, Err(PqrsError::Config(_))));
    }
}
