//! Shared primitives used across Longform crates.

use core::fmt;

/// Result alias used across the workspace.
pub type RedirectResult<T> = Result<T, RedirectError>;

/// Error raised by the redirect pipeline or the page binding underneath it.
///
/// `code` is a stable dotted identifier (`page.location_unavailable`) that
/// tests and logs match on; `message` is free-form detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectError {
    pub code: &'static str,
    pub message: String,
}

impl RedirectError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for failures surfaced by the host page platform.
    pub fn platform(code: &'static str, detail: impl fmt::Display) -> Self {
        Self::new(code, format!("platform call failed: {detail}"))
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RedirectError {}
