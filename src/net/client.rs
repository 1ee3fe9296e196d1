//! Single chokepoint for outbound API calls.
//!
//! DESIGN
//! ======
//! `RequestClient` is cheap to clone (all state is behind one `Arc`) and is
//! constructed once at process start. It owns the in-memory bearer credential
//! and mirrors it into the token slot of [`SessionStorage`].
//!
//! ERROR HANDLING
//! ==============
//! Every failure becomes a [`RequestError`]; nothing is retried or recovered
//! locally. A 401 to a credentialed request other than login or register is
//! treated as session expiry: the credential is cleared and the unauthorized
//! hook fires so the session layer can drop the cached identity. The error is
//! still returned to the caller, including callers that have since lost
//! interest.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::api::{AUTH_LOGIN, AUTH_REGISTER};
use super::error::{RequestError, status_fallback_message};
use super::types::ApiErrorBody;
use crate::storage::{SessionStorage, TOKEN_KEY};

/// Callback fired after a 401 clears the credential.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;


#[derive(Clone)]
pub struct RequestClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    storage: Arc<dyn SessionStorage>,
    credential: Mutex<Option<String>>,
    on_unauthorized: Mutex<Option<UnauthorizedHook>>,
}

impl std::fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestClient")
            .field("base_url", &self.inner.base_url)
            .field("has_credential", &self.has_credential())
            .finish_non_exhaustive()
    }
}

impl RequestClient {
    /// Create a client targeting `base_url`. Any token already in storage is
    /// installed so a restored session authenticates its first request.
    #[must_use]
    pub fn new(base_url: &str, storage: Arc<dyn SessionStorage>) -> Self {
        let credential = match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored token");
                None
            }
        };
        Self {
            inner: Arc::new(ClientInner {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                storage,
                credential: Mutex::new(credential),
                on_unauthorized: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.inner.storage
    }

    /// The currently installed bearer token, if any.
    #[must_use]
    pub fn credential(&self) -> Option<String> {
        self.inner
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.inner
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Install `token` for subsequent requests and persist it.
    ///
    /// A storage failure is logged; the in-memory credential is still installed.
    pub fn set_credential(&self, token: &str) {
        *self.inner.credential.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        if let Err(e) = self.inner.storage.set(TOKEN_KEY, token) {
            tracing::warn!(error = %e, "failed to persist token");
        }
    }

    /// Remove the bearer token and erase it from storage.
    pub fn clear_credential(&self) {
        *self.inner.credential.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(e) = self.inner.storage.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "failed to erase stored token");
        }
    }

    /// Register the callback fired when a 401 expires the session. Replaces
    /// any previously installed hook.
    pub fn install_unauthorized_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self
            .inner
            .on_unauthorized
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    /// Send a request with an optional JSON body and return the parsed JSON
    /// response.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] with the HTTP status for non-success
    /// responses, status `0` for an unparseable success body, and status `-1`
    /// when no response arrives.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, RequestError> {
        self.dispatch(method, path, body).await
    }

    /// Like [`send`](Self::send) but serializes any `Serialize` body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn send_json<B>(&self, method: Method, path: &str, body: &B) -> Result<Value, RequestError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.dispatch(method, path, Some(body)).await
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn get(&self, path: &str) -> Result<Value, RequestError> {
        self.send(Method::GET, path, None).await
    }

    /// `POST path` with an optional JSON body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, RequestError> {
        self.send(Method::POST, path, body).await
    }

    /// `PUT path` with an optional JSON body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn put(&self, path: &str, body: Option<&Value>) -> Result<Value, RequestError> {
        self.send(Method::PUT, path, body).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn delete(&self, path: &str) -> Result<Value, RequestError> {
        self.send(Method::DELETE, path, None).await
    }

    async fn dispatch<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Value, RequestError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{}", self.inner.base_url, path);
        let token = self.credential();

        let mut request = self
            .inner
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, authenticated = token.is_some(), "api request");
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, path, error = %e, "api request failed without response");
                return Err(RequestError::unreachable());
            }
        };

        let status = response.status();
        let bytes = response.bytes().await;

        if !status.is_success() {
            let message = bytes
                .ok()
                .and_then(|b| error_message_from_body(&b))
                .unwrap_or_else(|| status_fallback_message(status.as_u16()));
            let err = RequestError::new(i32::from(status.as_u16()), message);
            tracing::warn!(%method, path, status = status.as_u16(), message = %err.message, "api request rejected");
            if err.is_unauthorized() {
                if let Some(token) = token {
                    if !is_credential_exchange(path) {
                        self.expire_session(&token);
                    }
                }
            }
            return Err(err);
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let bytes = bytes.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "failed to read response body");
            RequestError::malformed()
        })?;
        parse_success_body(&bytes)
    }

    /// Clear the credential after a 401, unless a newer login already replaced
    /// the token that was rejected.
    fn expire_session(&self, rejected: &str) {
        {
            let mut credential = self.inner.credential.lock().unwrap_or_else(PoisonError::into_inner);
            if credential.as_deref() != Some(rejected) {
                return;
            }
            *credential = None;
        }
        if let Err(e) = self.inner.storage.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "failed to erase stored token");
        }
        tracing::info!("session expired; credential cleared");

        let hook = self
            .inner
            .on_unauthorized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

/// Login and register exchange credentials; their 401s mean "wrong
/// password", not "session expired". Any query string is ignored.
pub(crate) fn is_credential_exchange(path: &str) -> bool {
    let route = path.split(['?', '#']).next().unwrap_or(path).trim_end_matches('/');
    route == AUTH_LOGIN || route == AUTH_REGISTER
}

/// Extract a human-readable message from a failed response body.
pub(crate) fn error_message_from_body(body: &[u8]) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_slice(body).ok()?;
    parsed.message.filter(|m| !m.trim().is_empty())
}

pub(crate) fn parse_success_body(body: &[u8]) -> Result<Value, RequestError> {
    serde_json::from_slice(body).map_err(|_| RequestError::malformed())
}
