//! HTTP plumbing for the Campus Connect REST API.

pub mod api;
pub mod client;
pub mod error;
pub mod types;
