//! Session state and its owner.

pub mod auth;
pub mod session;
