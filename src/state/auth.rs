//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by the access gate and by any identity-dependent view. Only
//! [`super::session::SessionManager`] produces these values.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use serde::{Deserialize, Serialize};

use crate::net::types::BackendUser;

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    /// Map the backend role vocabulary. Only `ADMIN` is privileged.
    #[must_use]
    pub fn from_backend(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("ADMIN") { Self::Admin } else { Self::Student }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }
}

/// Normalized client-side view of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserIdentity {
    /// Derive an identity from the backend's user record. Deterministic: the
    /// same record always yields the same identity.
    #[must_use]
    pub fn from_backend(user: &BackendUser) -> Self {
        Self {
            id: user.id.clone(),
            display_name: display_name(user),
            email: user.email.clone(),
            role: Role::from_backend(&user.role),
            department: user.department.clone().filter(|d| !d.is_empty()),
            year: user.year.clone().filter(|y| !y.is_empty()),
            avatar_url: Some(avatar_url(&user.email)),
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn display_name(user: &BackendUser) -> String {
    let full = format!("{} {}", user.first_name.trim(), user.last_name.trim());
    let full = full.trim();
    if full.is_empty() { user.username.clone() } else { full.to_owned() }
}

/// Avatar URL seeded by email, so every client renders the same picture.
#[must_use]
pub fn avatar_url(email: &str) -> String {
    format!("{AVATAR_BASE_URL}?seed={}", urlencoding::encode(email))
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Where the session lifecycle currently stands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Startup restoration has not run yet.
    #[default]
    Unknown,
    Anonymous,
    Authenticated(UserIdentity),
}

impl SessionState {
    #[must_use]
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unknown | Self::Anonymous => None,
        }
    }
}

/// Externally observable session value, republished on every transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<UserIdentity>,
    /// True during startup restoration and while a login is in flight.
    pub is_loading: bool,
}

impl SessionSnapshot {
    /// Snapshot before restoration has completed.
    #[must_use]
    pub fn unknown() -> Self {
        Self { user: None, is_loading: true }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None, is_loading: false }
    }

    #[must_use]
    pub fn authenticated(user: UserIdentity) -> Self {
        Self { user: Some(user), is_loading: false }
    }

    /// Build the snapshot for `state`, with `pending_logins` logins in flight.
    #[must_use]
    pub fn from_state(state: &SessionState, pending_logins: usize) -> Self {
        Self {
            user: state.user().cloned(),
            is_loading: matches!(state, SessionState::Unknown) || pending_logins > 0,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::unknown()
    }
}
