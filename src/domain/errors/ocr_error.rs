//! OCR service error types.

use thiserror::Error;

/// Errors raised by the OCR service adapter.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum OcrError {
    #[error("OCR transport failure: {message}")]
    Transport { message: String },

    #[error("OCR service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid OCR response: {reason}")]
    InvalidResponse { reason: String },
}

impl OcrError {
    /// Creates transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates invalid response error.
    #[must_use]
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}
