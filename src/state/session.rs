//! Authoritative owner of "who is logged in".
//!
//! ARCHITECTURE
//! ============
//! `SessionManager` holds a [`SessionState`] behind a short-lived mutex and
//! republishes a [`SessionSnapshot`] through a `tokio::sync::watch` channel on
//! every transition. Views and the access gate subscribe; only `restore`,
//! `login`, `register`, `logout` and session expiry mutate.
//!
//! Transitions:
//!
//! ```text
//! Unknown ──restore──▶ Anonymous | Authenticated(U)
//! Anonymous ──login ok──▶ Authenticated(U)
//! Authenticated(U) ──login ok──▶ Authenticated(U')   (account switch)
//! Authenticated(U) ──logout / 401 on data call──▶ Anonymous
//! any ──login fails──▶ unchanged
//! ```
//!
//! TRADE-OFFS
//! ==========
//! Restoration is optimistic: a stored token is trusted without asking the
//! backend. A revoked token therefore looks signed-in until the first data
//! call comes back 401, at which point the request client's unauthorized hook
//! drops the session here.
//!
//! Overlapping logins are not serialized. Each success replaces the whole
//! state, so the last one to complete wins.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;

use super::auth::{SessionSnapshot, SessionState, UserIdentity};
use crate::authenticator::{Authenticator, BackendAuthenticator};
use crate::net::client::RequestClient;
use crate::net::error::RequestError;
use crate::net::types::{Credential, LoginResponse, RegisterRequest};
use crate::storage::{SessionStorage, TOKEN_KEY, USER_KEY};

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: RequestClient,
    authenticator: Arc<dyn Authenticator>,
    core: Mutex<SessionCore>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

#[derive(Default)]
struct SessionCore {
    state: SessionState,
    pending_logins: usize,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("client", &self.inner.client)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager in the `Unknown` state. Call [`restore`](Self::restore)
    /// before trusting any gate decision.
    #[must_use]
    pub fn new(client: RequestClient, authenticator: Arc<dyn Authenticator>) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::unknown());
        let inner = Arc::new(SessionInner {
            client,
            authenticator,
            core: Mutex::new(SessionCore::default()),
            snapshot_tx,
        });

        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        inner.client.install_unauthorized_hook(move || {
            if let Some(inner) = weak.upgrade() {
                inner.expire();
            }
        });

        Self { inner }
    }

    /// Manager that authenticates against the backend behind `client`.
    #[must_use]
    pub fn with_backend(client: RequestClient) -> Self {
        let authenticator = Arc::new(BackendAuthenticator::new(client.clone()));
        Self::new(client, authenticator)
    }

    /// The request client data calls should go through.
    #[must_use]
    pub fn client(&self) -> &RequestClient {
        &self.inner.client
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock_core().state.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Rebuild the session from durable storage.
    ///
    /// Authenticated iff both the token slot and a parseable identity slot are
    /// present. Anything else resolves to `Anonymous` and erases whichever
    /// half was left behind. Never fails.
    pub fn restore(&self) -> SessionState {
        let storage = self.inner.client.storage();
        let token = read_slot(storage.as_ref(), TOKEN_KEY).filter(|t| !t.is_empty());
        let cached = read_slot(storage.as_ref(), USER_KEY);

        let restored = match (token, cached) {
            (Some(token), Some(raw)) => match serde_json::from_str::<UserIdentity>(&raw) {
                Ok(user) => Some((token, user)),
                Err(e) => {
                    tracing::warn!(error = %e, "cached identity unreadable; starting anonymous");
                    None
                }
            },
            _ => None,
        };

        let mut core = self.inner.lock_core();
        core.state = match restored {
            Some((token, user)) => {
                if self.inner.client.credential().as_deref() != Some(token.as_str()) {
                    self.inner.client.set_credential(&token);
                }
                tracing::info!(user_id = %user.id, role = user.role.as_str(), "session restored");
                SessionState::Authenticated(user)
            }
            None => {
                self.inner.client.clear_credential();
                remove_slot(storage.as_ref(), USER_KEY);
                tracing::debug!("no stored session");
                SessionState::Anonymous
            }
        };
        self.inner.publish(&core);
        core.state.clone()
    }

    /// Sign in with email and password.
    ///
    /// On success the token is installed, the derived identity is cached and
    /// published, and any previous identity is replaced. On failure the
    /// existing session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns the authenticator's [`RequestError`] unchanged so the caller
    /// can display its message.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, RequestError> {
        let credential = Credential::new(email, password);
        let pending = PendingLogin::start(&self.inner);
        let result = self.inner.authenticator.login(&credential).await;
        pending.finish(result)
    }

    /// Create an account and sign in as it. Same transition rules as
    /// [`login`](Self::login).
    ///
    /// # Errors
    ///
    /// Returns the authenticator's [`RequestError`] unchanged.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserIdentity, RequestError> {
        let pending = PendingLogin::start(&self.inner);
        let result = self.inner.authenticator.register(request).await;
        pending.finish(result)
    }

    /// Drop the session locally. Does not contact the backend; idempotent.
    pub fn logout(&self) {
        let mut core = self.inner.lock_core();
        self.inner.client.clear_credential();
        remove_slot(self.inner.client.storage().as_ref(), USER_KEY);
        if let SessionState::Authenticated(user) = &core.state {
            tracing::info!(user_id = %user.id, "logged out");
        }
        core.state = SessionState::Anonymous;
        self.inner.publish(&core);
    }
}

impl SessionInner {
    fn lock_core(&self) -> std::sync::MutexGuard<'_, SessionCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, core: &SessionCore) {
        self.snapshot_tx
            .send_replace(SessionSnapshot::from_state(&core.state, core.pending_logins));
    }

    /// Called by the request client after a 401 already cleared the token.
    fn expire(&self) {
        let mut core = self.lock_core();
        if let SessionState::Authenticated(user) = &core.state {
            tracing::info!(user_id = %user.id, "session expired");
            remove_slot(self.client.storage().as_ref(), USER_KEY);
            core.state = SessionState::Anonymous;
            self.publish(&core);
        }
    }
}

/// Tracks one in-flight login so `is_loading` stays accurate even if the
/// login future is dropped before completing.
struct PendingLogin<'a> {
    inner: &'a SessionInner,
    finished: bool,
}

impl<'a> PendingLogin<'a> {
    fn start(inner: &'a SessionInner) -> Self {
        let mut core = inner.lock_core();
        core.pending_logins += 1;
        inner.publish(&core);
        Self { inner, finished: false }
    }

    fn finish(mut self, result: Result<LoginResponse, RequestError>) -> Result<UserIdentity, RequestError> {
        self.finished = true;
        let mut core = self.inner.lock_core();
        core.pending_logins = core.pending_logins.saturating_sub(1);

        // A blank token restores as Anonymous, so it must never be installed.
        let result = result.and_then(|response| {
            if response.token.trim().is_empty() {
                Err(RequestError::malformed())
            } else {
                Ok(response)
            }
        });

        let outcome = match result {
            Ok(response) => {
                let user = UserIdentity::from_backend(&response.user);
                self.inner.client.set_credential(&response.token);
                cache_identity(self.inner.client.storage().as_ref(), &user);
                tracing::info!(user_id = %user.id, role = user.role.as_str(), "login succeeded");
                core.state = SessionState::Authenticated(user.clone());
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(status = e.status, message = %e.message, "login failed");
                Err(e)
            }
        };
        self.inner.publish(&core);
        outcome
    }
}

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut core = self.inner.lock_core();
            core.pending_logins = core.pending_logins.saturating_sub(1);
            self.inner.publish(&core);
        }
    }
}

fn read_slot(storage: &dyn SessionStorage, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed");
            None
        }
    }
}

fn remove_slot(storage: &dyn SessionStorage, key: &str) {
    if let Err(e) = storage.remove(key) {
        tracing::warn!(key, error = %e, "storage remove failed");
    }
}

fn cache_identity(storage: &dyn SessionStorage, user: &UserIdentity) {
    let encoded = match serde_json::to_string(user) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode identity");
            return;
        }
    };
    if let Err(e) = storage.set(USER_KEY, &encoded) {
        tracing::warn!(error = %e, "failed to cache identity");
    }
}
