//! Client-side session management and route access control for Campus Connect.
//!
//! ARCHITECTURE
//! ============
//! Three layers, composed bottom-up:
//!
//! - [`net::client::RequestClient`] issues HTTP calls, attaches the bearer
//!   credential, and normalizes every failure into [`net::error::RequestError`].
//! - [`state::session::SessionManager`] owns the login lifecycle, persists the
//!   token and cached identity in [`storage::SessionStorage`], and publishes a
//!   [`state::auth::SessionSnapshot`] to subscribers.
//! - [`gate::decide`] maps a snapshot and a requested path to an access decision.
//!
//! Everything is constructed once at process start and passed down explicitly;
//! there is no module-level mutable state.

pub mod authenticator;
pub mod config;
pub mod gate;
pub mod net;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use authenticator::{Authenticator, BackendAuthenticator, DemoAuthenticator};
pub use config::SessionConfig;
pub use gate::{AccessDecision, decide, should_defer};
pub use net::client::RequestClient;
pub use net::error::RequestError;
pub use state::auth::{Role, SessionSnapshot, SessionState, UserIdentity};
pub use state::session::SessionManager;
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
