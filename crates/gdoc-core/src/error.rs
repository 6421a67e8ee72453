//! Error types for gdoc-core
//!
//! Provides error handling for:
//! - Remote call failures (the one error a backend can raise)
//! - Session misuse (editing with no active document)
//! - Invalid local input (heading levels, ragged tables)
//! - Configuration parsing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a remote failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// Quota or rate limit hit (HTTP 429)
    RateLimited,
    /// Service unavailable or internal failure (HTTP 5xx)
    Unavailable,
    /// Connection, TLS or timeout failure before a response arrived
    Transport,
    /// Credentials missing or expired (HTTP 401)
    Unauthenticated,
    /// Caller lacks access to the document (HTTP 403)
    PermissionDenied,
    /// Document or file does not exist (HTTP 404)
    NotFound,
    /// Request rejected as malformed (HTTP 400)
    InvalidRequest,
    /// Response body could not be decoded
    Decode,
    /// Anything else
    Other,
}

impl RemoteErrorKind {
    /// Map an HTTP status code to a kind
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            500..=599 => Self::Unavailable,
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            400 => Self::InvalidRequest,
            _ => Self::Other,
        }
    }

    /// Check if a later attempt can plausibly succeed
    #[inline]
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Unavailable | Self::Transport | Self::Other
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate limited",
            Self::Unavailable => "unavailable",
            Self::Transport => "transport",
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission denied",
            Self::NotFound => "not found",
            Self::InvalidRequest => "invalid request",
            Self::Decode => "decode",
            Self::Other => "remote",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a remote document or drive call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct RemoteError {
    kind: RemoteErrorKind,
    message: String,
}

impl RemoteError {
    /// Create new remote error
    #[inline]
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create error from an HTTP status and response body
    #[inline]
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.is_empty() {
            format!("status {status}")
        } else {
            format!("status {status}: {body}")
        };
        Self::new(RemoteErrorKind::from_status(status), message)
    }

    /// Rate-limited error
    #[inline]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::RateLimited, message)
    }

    /// Service-unavailable error
    #[inline]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unavailable, message)
    }

    /// Transport error
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transport, message)
    }

    /// Permission-denied error
    #[inline]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::PermissionDenied, message)
    }

    /// Not-found error
    #[inline]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    /// Decode error
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Decode, message)
    }

    /// Error classification
    #[inline]
    #[must_use]
    pub fn kind(&self) -> RemoteErrorKind {
        self.kind
    }

    /// Error message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if error is transient
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Main gdoc error type
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// Remote call failed after the retry budget was spent
    #[error("remote operation failed: {0}")]
    Remote(#[from] RemoteError),

    /// No document handle is active on the session
    #[error("no active document: create one or set a handle first")]
    NoActiveDocument,

    /// Heading level outside HEADING_1..=HEADING_6
    #[error("heading level must be between 1 and 6, got {0}")]
    InvalidHeadingLevel(u8),

    /// Tabular data is not rectangular or is empty
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DocsError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_transient())
    }

    /// Underlying remote error, if any
    #[inline]
    #[must_use]
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(e) => Some(e),
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required variable not set
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    /// Variable set but unparseable
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create invalid-value error
    pub fn invalid(var: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
