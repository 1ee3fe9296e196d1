//! Credential → login-response strategies.
//!
//! DESIGN
//! ======
//! The session manager depends on [`Authenticator`] by interface, so the
//! backend call can be swapped for the offline [`DemoAuthenticator`] or a
//! test fake without touching storage or gate logic.

#[cfg(test)]
#[path = "authenticator_test.rs"]
mod tests;

use std::fmt::Write;

use rand::Rng;
use reqwest::Method;
use serde_json::Value;

use crate::net::api::{AUTH_LOGIN, AUTH_REGISTER};
use crate::net::client::RequestClient;
use crate::net::error::RequestError;
use crate::net::types::{BackendUser, Credential, LoginResponse, RegisterRequest};

/// Exchanges credentials for a token and a raw user record.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate an existing account.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] carrying a displayable message when the
    /// credential is rejected or the exchange fails.
    async fn login(&self, credential: &Credential) -> Result<LoginResponse, RequestError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] carrying a displayable message when the
    /// registration is rejected or the exchange fails.
    async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, RequestError>;
}

// =============================================================================
// BACKEND
// =============================================================================

/// Authenticates against `POST /auth/login` and `POST /auth/register`.
#[derive(Clone, Debug)]
pub struct BackendAuthenticator {
    client: RequestClient,
}

impl BackendAuthenticator {
    #[must_use]
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Authenticator for BackendAuthenticator {
    async fn login(&self, credential: &Credential) -> Result<LoginResponse, RequestError> {
        let body = self.client.send_json(Method::POST, AUTH_LOGIN, credential).await?;
        parse_login_response(body)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, RequestError> {
        let body = self.client.send_json(Method::POST, AUTH_REGISTER, request).await?;
        parse_login_response(body)
    }
}

/// A success body that lacks the token or user, or carries a blank token, is
/// as unusable as invalid JSON.
pub(crate) fn parse_login_response(body: Value) -> Result<LoginResponse, RequestError> {
    let response: LoginResponse = serde_json::from_value(body).map_err(|e| {
        tracing::warn!(error = %e, "login response did not match expected shape");
        RequestError::malformed()
    })?;
    if response.token.trim().is_empty() {
        tracing::warn!("login response carried a blank token");
        return Err(RequestError::malformed());
    }
    Ok(response)
}

// =============================================================================
// DEMO
// =============================================================================

pub const DEMO_ADMIN_EMAIL: &str = "admin@campus.edu";

/// Offline authenticator: accepts any non-empty email and password.
///
/// `admin@campus.edu` signs in as an administrator; everyone else is a
/// third-year Computer Science student.
#[derive(Clone, Copy, Debug, Default)]
pub struct DemoAuthenticator;

impl DemoAuthenticator {
    fn issue(user: BackendUser) -> LoginResponse {
        LoginResponse { token: generate_token(), refresh_token: Some(generate_token()), user }
    }
}

#[async_trait::async_trait]
impl Authenticator for DemoAuthenticator {
    async fn login(&self, credential: &Credential) -> Result<LoginResponse, RequestError> {
        if credential.email.trim().is_empty() || credential.password.is_empty() {
            return Err(invalid_credentials());
        }
        Ok(Self::issue(demo_user(credential.email.trim())))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, RequestError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(invalid_credentials());
        }
        let mut user = demo_user(request.email.trim());
        user.username.clone_from(&request.username);
        user.first_name.clone_from(&request.first_name);
        user.last_name.clone_from(&request.last_name);
        Ok(Self::issue(user))
    }
}

fn invalid_credentials() -> RequestError {
    RequestError::new(401, "Invalid credentials")
}

fn demo_user(email: &str) -> BackendUser {
    let is_admin = email == DEMO_ADMIN_EMAIL;
    let (first_name, last_name) = if is_admin { ("Admin", "User") } else { ("John", "Doe") };
    BackendUser {
        id: "1".to_owned(),
        username: email.split('@').next().unwrap_or(email).to_owned(),
        email: email.to_owned(),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        role: if is_admin { "ADMIN" } else { "STUDENT" }.to_owned(),
        department: (!is_admin).then(|| "Computer Science".to_owned()),
        year: (!is_admin).then(|| "3rd Year".to_owned()),
    }
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}
