//! Homeserver communication error types.

use thiserror::Error;

/// Errors raised while talking to the Matrix homeserver.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ProtocolError {
    #[error("network error talking to homeserver: {message}")]
    Network { message: String },

    #[error("homeserver rejected request with {status} ({errcode}): {message}")]
    Rejected {
        status: u16,
        errcode: String,
        message: String,
    },

    #[error("rate limited by homeserver, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("unexpected homeserver error: {message}")]
    Unexpected { message: String },
}

impl ProtocolError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates rejected error.
    #[must_use]
    pub fn rejected(status: u16, errcode: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            errcode: errcode.into(),
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether the request could succeed if repeated later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimited { .. })
    }

    /// Returns the HTTP status of a rejected request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
