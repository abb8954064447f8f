//! Resolves image messages into raw image bytes.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use super::attachment_decryptor::decrypt_attachment;
use crate::domain::entities::{MessageContent, MxcUri};
use crate::domain::errors::MediaError;
use crate::domain::ports::MessagingPort;

/// Raw image bytes along with how they were stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// Plaintext image bytes.
    pub bytes: Bytes,
    /// Whether the media was uploaded as an encrypted attachment.
    pub encrypted: bool,
}

/// Downloads media referenced by a message, decrypting it when needed.
#[derive(Clone)]
pub struct MediaResolver {
    messaging: Arc<dyn MessagingPort>,
}

impl MediaResolver {
    /// Creates a resolver that downloads through the given port.
    #[must_use]
    pub fn new(messaging: Arc<dyn MessagingPort>) -> Self {
        Self { messaging }
    }

    /// Resolves message content into plaintext bytes.
    ///
    /// # Errors
    /// Returns error if the content carries no usable media reference, the
    /// download fails, or the attachment cannot be verified and decrypted.
    pub async fn resolve(&self, content: &MessageContent) -> Result<ResolvedMedia, MediaError> {
        match &content.file {
            None => {
                let url = content
                    .url
                    .as_deref()
                    .ok_or_else(|| MediaError::missing_reference("no url in content"))?;
                let bytes = self.download(url).await?;

                debug!(size = bytes.len(), "Downloaded unencrypted media");
                Ok(ResolvedMedia {
                    bytes,
                    encrypted: false,
                })
            }
            Some(file) => {
                let url = file
                    .url
                    .as_deref()
                    .ok_or_else(|| MediaError::missing_reference("no url in encrypted file"))?;
                let ciphertext = self.download(url).await?;

                debug!(size = ciphertext.len(), "Downloaded encrypted media");
                let plaintext = decrypt_attachment(&ciphertext, file)?;

                Ok(ResolvedMedia {
                    bytes: Bytes::from(plaintext),
                    encrypted: true,
                })
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes, MediaError> {
        let uri = MxcUri::parse(url).ok_or_else(|| MediaError::invalid_uri(url))?;
        Ok(self.messaging.download_media(&uri).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{EncryptedFile, JsonWebKey, MessageType};
    use crate::domain::ports::mocks::{Call, CallLog, MockMessaging};
    use std::collections::HashMap;

    fn image_content(url: Option<&str>, file: Option<EncryptedFile>) -> MessageContent {
        MessageContent {
            msgtype: MessageType::Image,
            body: "image.png".to_string(),
            url: url.map(str::to_string),
            file,
        }
    }

    fn bogus_file(url: Option<&str>) -> EncryptedFile {
        let mut hashes = HashMap::new();
        hashes.insert(
            "sha256".to_string(),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU".to_string(),
        );
        EncryptedFile {
            url: url.map(str::to_string),
            key: JsonWebKey {
                kty: "oct".to_string(),
                alg: "A256CTR".to_string(),
                k: "QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI".to_string(),
                key_ops: vec!["decrypt".to_string()],
                ext: true,
            },
            iv: "AQIDBAUGBwgAAAAAAAAAAA".to_string(),
            hashes,
            v: Some("v2".to_string()),
        }
    }

    #[tokio::test]
    async fn test_unencrypted_media_returned_as_is() {
        let log = CallLog::default();
        let messaging =
            Arc::new(MockMessaging::new(log.clone()).with_media("mxc://server/abc", &b"png"[..]));
        let resolver = MediaResolver::new(messaging);

        let media = resolver
            .resolve(&image_content(Some("mxc://server/abc"), None))
            .await
            .unwrap();

        assert_eq!(media.bytes, Bytes::from_static(b"png"));
        assert!(!media.encrypted);
        assert_eq!(log.calls(), vec![Call::Download("mxc://server/abc".to_string())]);
    }

    #[tokio::test]
    async fn test_missing_url_is_missing_reference() {
        let log = CallLog::default();
        let resolver = MediaResolver::new(Arc::new(MockMessaging::new(log.clone())));

        let result = resolver.resolve(&image_content(None, None)).await;

        assert!(matches!(result, Err(MediaError::MissingMediaReference { .. })));
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_encrypted_file_without_url_is_missing_reference() {
        let log = CallLog::default();
        let resolver = MediaResolver::new(Arc::new(MockMessaging::new(log.clone())));

        // A plain url next to the descriptor must not be used as a fallback.
        let content = image_content(Some("mxc://server/plain"), Some(bogus_file(None)));
        let result = resolver.resolve(&content).await;

        assert!(matches!(result, Err(MediaError::MissingMediaReference { .. })));
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_ciphertext_matches_declared_hash() {
        let log = CallLog::default();
        let messaging =
            Arc::new(MockMessaging::new(log).with_media("mxc://server/enc", Bytes::new()));
        let resolver = MediaResolver::new(messaging);

        // The declared hash above is sha256 of the empty string.
        let media = resolver
            .resolve(&image_content(None, Some(bogus_file(Some("mxc://server/enc")))))
            .await
            .unwrap();

        assert!(media.encrypted);
        assert!(media.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_hash_mismatch_is_decryption_failure() {
        let log = CallLog::default();
        let messaging =
            Arc::new(MockMessaging::new(log).with_media("mxc://server/enc", &b"tampered"[..]));
        let resolver = MediaResolver::new(messaging);

        let result = resolver
            .resolve(&image_content(None, Some(bogus_file(Some("mxc://server/enc")))))
            .await;

        assert!(matches!(result, Err(MediaError::DecryptionFailure { .. })));
    }

    #[tokio::test]
    async fn test_non_mxc_url_rejected() {
        let log = CallLog::default();
        let resolver = MediaResolver::new(Arc::new(MockMessaging::new(log.clone())));

        let result = resolver
            .resolve(&image_content(Some("https://example.org/a.png"), None))
            .await;

        assert!(matches!(result, Err(MediaError::InvalidMediaUri { .. })));
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_download_failure_propagates() {
        let log = CallLog::default();
        let resolver = MediaResolver::new(Arc::new(MockMessaging::new(log)));

        let result = resolver
            .resolve(&image_content(Some("mxc://server/missing"), None))
            .await;

        assert!(matches!(result, Err(MediaError::Download(_))));
    }
}
