//! OCR request options and results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::OcrError;

/// Recognition options sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrOptions {
    /// Delimiters wrapping inline math.
    pub math_inline_delimiters: [&'static str; 2],
    /// Delimiters wrapping display math.
    pub math_display_delimiters: [&'static str; 2],
    /// Strip redundant whitespace from the recognized text.
    pub rm_spaces: bool,
}

impl OcrOptions {
    /// The options used for the lifetime of the process.
    pub const DEFAULT: Self = Self {
        math_inline_delimiters: ["$", "$"],
        math_display_delimiters: ["$$", "$$"],
        rm_spaces: true,
    };

    /// Serializes the options to their canonical JSON form.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Parsed OCR service response.
///
/// Field order follows the service response.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    fields: Map<String, Value>,
}

impl OcrResult {
    /// Key holding the recognized text.
    pub const TEXT_KEY: &'static str = "text";

    /// Validates a JSON value as an OCR result.
    ///
    /// # Errors
    /// Returns [`OcrError::InvalidResponse`] if the value is not an object
    /// or has no string `text` field.
    pub fn from_value(value: Value) -> Result<Self, OcrError> {
        let Value::Object(fields) = value else {
            return Err(OcrError::invalid_response("response is not a JSON object"));
        };

        match fields.get(Self::TEXT_KEY) {
            Some(Value::String(_)) => Ok(Self { fields }),
            Some(_) => Err(OcrError::invalid_response("`text` field is not a string")),
            None => Err(OcrError::invalid_response("no `text` field in response")),
        }
    }

    /// Returns the recognized text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.fields
            .get(Self::TEXT_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Iterates over all fields in response order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over every field except `text`.
    pub fn metadata(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(key, _)| *key != Self::TEXT_KEY)
    }

    /// Returns a field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl TryFrom<Value> for OcrResult {
    type Error = OcrError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// How recognition results are rendered into replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormattingMode {
    /// One reply: metadata block followed by the text block.
    #[default]
    Single,
    /// Two replies: a metadata list, then the text block.
    Split,
}

impl std::fmt::Display for FormattingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Split => write!(f, "split"),
        }
    }
}

impl std::str::FromStr for FormattingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "split" => Ok(Self::Split),
            other => Err(format!("unknown formatting mode `{other}`, expected single or split")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_canonical_json() {
        let json = OcrOptions::DEFAULT.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"math_inline_delimiters":["$","$"],"math_display_delimiters":["$$","$$"],"rm_spaces":true}"#
        );
    }

    #[test]
    fn test_result_requires_text() {
        let result = OcrResult::from_value(json!({ "confidence": 0.9 }));
        assert!(matches!(result, Err(OcrError::InvalidResponse { .. })));
    }

    #[test]
    fn test_result_rejects_non_string_text() {
        let result = OcrResult::from_value(json!({ "text": 42 }));
        assert!(matches!(result, Err(OcrError::InvalidResponse { .. })));
    }

    #[test]
    fn test_result_rejects_non_object() {
        let result = OcrResult::from_value(json!(["text"]));
        assert!(matches!(result, Err(OcrError::InvalidResponse { .. })));
    }

    #[test]
    fn test_metadata_preserves_order_and_skips_text() {
        let result = OcrResult::from_value(json!({
            "request_id": "abc",
            "text": "x^2",
            "confidence": 0.9
        }))
        .unwrap();

        let keys: Vec<&str> = result.metadata().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["request_id", "confidence"]);
        assert_eq!(result.text(), "x^2");
    }

    #[test]
    fn test_formatting_mode_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: FormattingMode,
        }

        let parsed: Wrapper = toml::from_str(r#"mode = "split""#).unwrap();
        assert_eq!(parsed.mode, FormattingMode::Split);
    }

    #[test]
    fn test_formatting_mode_from_str() {
        assert_eq!("single".parse::<FormattingMode>(), Ok(FormattingMode::Single));
        assert_eq!("Split".parse::<FormattingMode>(), Ok(FormattingMode::Split));
        assert!("both".parse::<FormattingMode>().is_err());
    }
}
