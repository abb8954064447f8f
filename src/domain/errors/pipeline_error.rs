//! Errors that abort one OCR pipeline run.

use thiserror::Error;

use super::{MediaError, OcrError, ProtocolError};

/// Failure of a single pipeline run, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Media could not be resolved.
    #[error(transparent)]
    Media(#[from] MediaError),

    /// The OCR request failed.
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// The acknowledgement reaction could not be sent.
    #[error("failed to acknowledge event: {0}")]
    Acknowledgement(#[source] ProtocolError),

    /// A reply could not be delivered.
    #[error("failed to deliver reply: {0}")]
    ReplyDelivery(#[source] ProtocolError),
}

impl PipelineError {
    /// Short label of the failing stage for logs.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Media(MediaError::DecryptionFailure { .. }) => "decrypt",
            Self::Media(_) => "media",
            Self::Ocr(_) => "ocr",
            Self::Acknowledgement(_) => "acknowledge",
            Self::ReplyDelivery(_) => "reply",
        }
    }
}
