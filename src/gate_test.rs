use super::*;
use crate::state::auth::UserIdentity;
use crate::test_helpers::backend_user;

const ALLOW_LIST: [&str; 4] = ["/", "/login", "/login/forgot", "/signup"];
const PROTECTED: [&str; 7] = [
    "/dashboard",
    "/events",
    "/events/42",
    "/projects/create",
    "/profile",
    "/no-such-page",
    "",
];

fn authenticated() -> SessionSnapshot {
    SessionSnapshot::authenticated(UserIdentity::from_backend(&backend_user("STUDENT")))
}

fn every_snapshot() -> Vec<SessionSnapshot> {
    vec![
        SessionSnapshot::unknown(),
        SessionSnapshot::anonymous(),
        authenticated(),
        SessionSnapshot { user: None, is_loading: true },
    ]
}

// =============================================================================
// decide
// =============================================================================

#[test]
fn allow_list_is_open_in_every_state() {
    for snapshot in every_snapshot() {
        for path in ALLOW_LIST {
            assert_eq!(decide(&snapshot, path), AccessDecision::Allow, "{path} with {snapshot:?}");
        }
    }
}

#[test]
fn protected_paths_redirect_when_anonymous() {
    let snapshot = SessionSnapshot::anonymous();
    for path in PROTECTED {
        assert_eq!(
            decide(&snapshot, path),
            AccessDecision::RedirectToLogin { return_path: path.to_owned() },
            "{path}"
        );
    }
}

#[test]
fn protected_paths_allowed_when_authenticated() {
    let snapshot = authenticated();
    for path in PROTECTED {
        assert_eq!(decide(&snapshot, path), AccessDecision::Allow, "{path}");
    }
}

#[test]
fn unknown_snapshot_is_treated_as_anonymous() {
    assert_eq!(
        decide(&SessionSnapshot::unknown(), "/dashboard"),
        AccessDecision::RedirectToLogin { return_path: "/dashboard".to_owned() }
    );
}

#[test]
fn return_path_keeps_query_string() {
    assert_eq!(
        decide(&SessionSnapshot::anonymous(), "/events?tag=ai"),
        AccessDecision::RedirectToLogin { return_path: "/events?tag=ai".to_owned() }
    );
}

#[test]
fn prefix_rule_covers_nested_auth_pages() {
    assert!(is_public_path("/login/forgot"));
    assert!(is_public_path("/signup/verify"));
    assert!(!is_public_path("/dashboard/login"));
    assert!(!is_public_path("/profile"));
}

// =============================================================================
// login_location / should_defer
// =============================================================================

#[test]
fn login_location_encodes_return_path() {
    let decision = AccessDecision::RedirectToLogin { return_path: "/events/7?tab=info".to_owned() };
    assert_eq!(
        decision.login_location().as_deref(),
        Some("/login?returnTo=%2Fevents%2F7%3Ftab%3Dinfo")
    );
}

#[test]
fn login_location_none_when_allowed() {
    assert_eq!(AccessDecision::Allow.login_location(), None);
}

#[test]
fn should_defer_only_while_loading() {
    assert!(should_defer(&SessionSnapshot::unknown()));
    assert!(!should_defer(&SessionSnapshot::anonymous()));
    assert!(!should_defer(&authenticated()));
}
