//! Secret values and OCR service credentials.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret string that is masked when printed and wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    value: String,
}

impl Secret {
    /// Wraps a secret value after trimming surrounding whitespace.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into().trim().to_string(),
        }
    }

    /// Returns the secret as a string slice.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Returns true if the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Returns masked secret for display.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let visible_prefix: String = self.value.chars().take(4).collect();
        format!("{visible_prefix}...")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&self.masked()).finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

/// Credentials for the Mathpix OCR service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    app_key: Secret,
    endpoint: String,
}

impl Credentials {
    /// Creates credentials, returning the names of any empty fields on failure.
    ///
    /// # Errors
    /// Returns the list of missing field names if any value is empty.
    pub fn new(
        app_id: impl Into<String>,
        app_key: Secret,
        endpoint: impl Into<String>,
    ) -> Result<Self, Vec<&'static str>> {
        let app_id = app_id.into().trim().to_string();
        let endpoint = endpoint.into().trim().to_string();

        let mut missing = Vec::new();
        if app_id.is_empty() {
            missing.push("app_id");
        }
        if app_key.is_empty() {
            missing.push("app_key");
        }
        if endpoint.is_empty() {
            missing.push("endpoint");
        }

        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(Self {
            app_id,
            app_key,
            endpoint,
        })
    }

    /// Returns the application identifier.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Returns the application key.
    #[must_use]
    pub const fn app_key(&self) -> &Secret {
        &self.app_key
    }

    /// Returns the OCR endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
