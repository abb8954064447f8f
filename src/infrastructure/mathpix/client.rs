//! Mathpix `v3/text` HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, multipart};
use tracing::{debug, warn};

use crate::domain::entities::{Credentials, OcrOptions, OcrResult};
use crate::domain::errors::OcrError;
use crate::domain::ports::OcrPort;

/// Default Mathpix text recognition endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.mathpix.com/v3/text";

const APP_ID_HEADER: &str = "app_id";
const APP_KEY_HEADER: &str = "app_key";
const ERROR_BODY_LIMIT: usize = 200;

/// OCR adapter posting images to Mathpix.
pub struct MathpixClient {
    client: Client,
    credentials: Credentials,
    options_json: String,
}

impl MathpixClient {
    /// Creates new client.
    ///
    /// # Errors
    /// Returns error if HTTP client creation or option serialization fails.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, OcrError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::transport(format!("failed to create HTTP client: {e}")))?;

        let options_json = OcrOptions::DEFAULT
            .to_json()
            .map_err(|e| OcrError::transport(format!("failed to serialize options: {e}")))?;

        Ok(Self {
            client,
            credentials,
            options_json,
        })
    }

    fn build_form(&self, image: Bytes) -> Result<multipart::Form, OcrError> {
        let file = multipart::Part::bytes(image.to_vec())
            .file_name("image")
            .mime_str("application/octet-stream")
            .map_err(|e| OcrError::transport(format!("invalid MIME type: {e}")))?;

        let options = multipart::Part::text(self.options_json.clone())
            .mime_str("application/json")
            .map_err(|e| OcrError::transport(format!("invalid MIME type: {e}")))?;

        Ok(multipart::Form::new()
            .part("file", file)
            .part("options_json", options))
    }
}

#[async_trait]
impl OcrPort for MathpixClient {
    async fn post_image(&self, image: Bytes) -> Result<OcrResult, OcrError> {
        let form = self.build_form(image)?;

        debug!(endpoint = %self.credentials.endpoint(), "Sending OCR request");

        let response = self
            .client
            .post(self.credentials.endpoint())
            .header(APP_ID_HEADER, self.credentials.app_id())
            .header(APP_KEY_HEADER, self.credentials.app_key().expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to reach OCR service");
                if e.is_timeout() {
                    OcrError::transport("request timed out")
                } else if e.is_connect() {
                    OcrError::transport("failed to connect to OCR service")
                } else {
                    OcrError::transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| OcrError::transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let snippet: String = String::from_utf8_lossy(&body)
                .chars()
                .take(ERROR_BODY_LIMIT)
                .collect();
            return Err(OcrError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "OCR response is not JSON");
            OcrError::invalid_response(format!("response is not JSON: {e}"))
        })?;

        let result = OcrResult::from_value(value)?;
        debug!(text_len = result.text().len(), "OCR response parsed");
        Ok(result)
    }
}
