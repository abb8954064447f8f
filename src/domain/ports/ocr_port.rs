//! OCR service port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::OcrResult;
use crate::domain::errors::OcrError;

/// Port for submitting images to the OCR service.
#[async_trait]
pub trait OcrPort: Send + Sync {
    /// Submits raw image bytes and returns the parsed recognition result.
    async fn post_image(&self, image: Bytes) -> Result<OcrResult, OcrError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::ports::messaging_port::mock::{Call, CallLog};

    /// OCR port returning a canned JSON response.
    pub struct MockOcr {
        log: CallLog,
        response: Result<serde_json::Value, String>,
    }

    impl MockOcr {
        pub fn returning(log: CallLog, response: serde_json::Value) -> Self {
            Self {
                log,
                response: Ok(response),
            }
        }

        pub fn failing(log: CallLog, message: &str) -> Self {
            Self {
                log,
                response: Err(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl OcrPort for MockOcr {
        async fn post_image(&self, image: Bytes) -> Result<OcrResult, OcrError> {
            self.log.push(Call::Ocr(image.len()));
            match &self.response {
                Ok(value) => OcrResult::from_value(value.clone()),
                Err(message) => Err(OcrError::Status {
                    status: 500,
                    body: message.clone(),
                }),
            }
        }
    }
}
