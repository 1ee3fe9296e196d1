//! Route access decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Consulted by the view layer on every navigation. The gate is a pure
//! function of the published snapshot and the requested path; it never touches
//! session state. It also has no notion of "pending": callers check
//! [`should_defer`] first and render a loading state until restoration settles.

#[cfg(test)]
#[path = "gate_test.rs"]
mod gate_test;

use crate::state::auth::SessionSnapshot;

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";

/// Query parameter carrying the original destination on the login URL.
pub const RETURN_TO_PARAM: &str = "returnTo";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Send the user to login, remembering where they were headed.
    RedirectToLogin { return_path: String },
}

impl AccessDecision {
    /// Where the caller should navigate: `None` to stay, or the login URL
    /// with the return path encoded as a query parameter.
    #[must_use]
    pub fn login_location(&self) -> Option<String> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin { return_path } => Some(format!(
                "{LOGIN_PATH}?{RETURN_TO_PARAM}={}",
                urlencoding::encode(return_path)
            )),
        }
    }
}

/// Paths reachable without a session: the landing page and the auth pages.
#[must_use]
pub fn is_public_path(path: &str) -> bool {
    path == "/" || path.starts_with(LOGIN_PATH) || path.starts_with(SIGNUP_PATH)
}

/// Decide whether `path` may be shown for `snapshot`.
#[must_use]
pub fn decide(snapshot: &SessionSnapshot, path: &str) -> AccessDecision {
    if is_public_path(path) || snapshot.is_authenticated() {
        AccessDecision::Allow
    } else {
        AccessDecision::RedirectToLogin { return_path: path.to_owned() }
    }
}

/// True while the snapshot is still settling and gate decisions are not yet
/// trustworthy.
#[must_use]
pub fn should_defer(snapshot: &SessionSnapshot) -> bool {
    snapshot.is_loading
}
