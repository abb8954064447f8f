//! Media resolution error types.

use thiserror::Error;

use super::ProtocolError;

/// Errors raised while turning a message into raw image bytes.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum MediaError {
    #[error("message has no media reference: {reason}")]
    MissingMediaReference { reason: String },

    #[error("invalid media uri: {uri}")]
    InvalidMediaUri { uri: String },

    #[error("failed to download media: {0}")]
    Download(#[from] ProtocolError),

    #[error("failed to decrypt attachment: {reason}")]
    DecryptionFailure { reason: String },
}

impl MediaError {
    /// Creates missing reference error.
    #[must_use]
    pub fn missing_reference(reason: impl Into<String>) -> Self {
        Self::MissingMediaReference {
            reason: reason.into(),
        }
    }

    /// Creates invalid uri error.
    #[must_use]
    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidMediaUri { uri: uri.into() }
    }

    /// Creates decryption error.
    #[must_use]
    pub fn decryption(reason: impl Into<String>) -> Self {
        Self::DecryptionFailure {
            reason: reason.into(),
        }
    }
}
