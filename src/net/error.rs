//! The single error kind crossing the request-client boundary.

/// Status used when the server answered with a success code but the body was
/// not valid JSON.
pub const STATUS_MALFORMED: i32 = 0;

/// Status used when no response reached the client at all.
pub const STATUS_UNREACHABLE: i32 = -1;

/// A failed API call.
///
/// `status` is the HTTP status for server-reported failures (>= 400), or one of
/// [`STATUS_MALFORMED`] / [`STATUS_UNREACHABLE`]. `message` is suitable for
/// showing to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    pub status: i32,
    pub message: String,
}

impl RequestError {
    #[must_use]
    pub fn new(status: i32, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    #[must_use]
    pub fn malformed() -> Self {
        Self::new(STATUS_MALFORMED, "malformed response")
    }

    #[must_use]
    pub fn unreachable() -> Self {
        Self::new(STATUS_UNREACHABLE, "network unreachable")
    }

    /// Fallback used when a failed response carries no readable message.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        Self::new(i32::from(status), status_fallback_message(status))
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

pub(crate) fn status_fallback_message(status: u16) -> String {
    format!("HTTP error! status: {status}")
}
