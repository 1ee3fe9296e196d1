//! Endpoint catalog and thin service helpers over [`RequestClient`].
//!
//! Domain payloads (events, projects, profiles) are passed through as
//! `serde_json::Value`; their content is owned by the view layer. Every call
//! goes through the same client, so a 401 on any of them expires the session.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde_json::Value;

use super::client::RequestClient;
use super::error::RequestError;

pub const AUTH_LOGIN: &str = "/auth/login";
pub const AUTH_REGISTER: &str = "/auth/register";
pub const AUTH_ME: &str = "/auth/me";
pub const AUTH_REFRESH: &str = "/auth/refresh";
pub const AUTH_LOGOUT: &str = "/auth/logout";

pub const USERS: &str = "/users";
pub const USERS_PROFILE: &str = "/users/profile";

pub const EVENTS: &str = "/events";
pub const PROJECTS: &str = "/projects";

pub const HEALTH: &str = "/actuator/health";

/// Ids are percent-encoded so they always stay a single path segment.
fn user_endpoint(id: &str) -> String {
    format!("{USERS}/{}", urlencoding::encode(id))
}

fn event_endpoint(id: &str) -> String {
    format!("{EVENTS}/{}", urlencoding::encode(id))
}

fn event_action_endpoint(id: &str, action: &str) -> String {
    format!("{EVENTS}/{}/{action}", urlencoding::encode(id))
}

fn project_endpoint(id: &str) -> String {
    format!("{PROJECTS}/{}", urlencoding::encode(id))
}

fn project_action_endpoint(id: &str, action: &str) -> String {
    format!("{PROJECTS}/{}/{action}", urlencoding::encode(id))
}

/// `GET /actuator/health`.
///
/// # Errors
///
/// Returns the client's [`RequestError`] unchanged.
pub async fn health(client: &RequestClient) -> Result<Value, RequestError> {
    client.get(HEALTH).await
}

// =============================================================================
// USERS
// =============================================================================

pub mod users {
    use super::*;

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn profile(client: &RequestClient) -> Result<Value, RequestError> {
        client.get(USERS_PROFILE).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn update_profile(client: &RequestClient, profile: &Value) -> Result<Value, RequestError> {
        client.put(USERS_PROFILE, Some(profile)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn list(client: &RequestClient) -> Result<Value, RequestError> {
        client.get(USERS).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn get(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.get(&user_endpoint(id)).await
    }
}

// =============================================================================
// EVENTS
// =============================================================================

pub mod events {
    use super::*;

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn list(client: &RequestClient) -> Result<Value, RequestError> {
        client.get(EVENTS).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn get(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.get(&event_endpoint(id)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn create(client: &RequestClient, event: &Value) -> Result<Value, RequestError> {
        client.post(EVENTS, Some(event)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn update(client: &RequestClient, id: &str, event: &Value) -> Result<Value, RequestError> {
        client.put(&event_endpoint(id), Some(event)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn delete(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.delete(&event_endpoint(id)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn register(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.post(&event_action_endpoint(id, "register"), None).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn unregister(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.delete(&event_action_endpoint(id, "unregister")).await
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

pub mod projects {
    use super::*;

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn list(client: &RequestClient) -> Result<Value, RequestError> {
        client.get(PROJECTS).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn get(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.get(&project_endpoint(id)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn create(client: &RequestClient, project: &Value) -> Result<Value, RequestError> {
        client.post(PROJECTS, Some(project)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn update(client: &RequestClient, id: &str, project: &Value) -> Result<Value, RequestError> {
        client.put(&project_endpoint(id), Some(project)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn delete(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.delete(&project_endpoint(id)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn like(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.post(&project_action_endpoint(id, "like"), None).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn unlike(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.delete(&project_action_endpoint(id, "unlike")).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn comments(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.get(&project_action_endpoint(id, "comments")).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn add_comment(client: &RequestClient, id: &str, comment: &Value) -> Result<Value, RequestError> {
        client.post(&project_action_endpoint(id, "comments"), Some(comment)).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn collaborators(client: &RequestClient, id: &str) -> Result<Value, RequestError> {
        client.get(&project_action_endpoint(id, "collaborators")).await
    }

    /// # Errors
    ///
    /// Returns the client's [`RequestError`] unchanged.
    pub async fn add_collaborator(
        client: &RequestClient,
        id: &str,
        collaborator: &Value,
    ) -> Result<Value, RequestError> {
        client
            .post(&project_action_endpoint(id, "collaborators"), Some(collaborator))
            .await
    }
}
