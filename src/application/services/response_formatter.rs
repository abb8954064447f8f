//! Renders OCR results as HTML replies.

use std::fmt::Write;

use serde_json::Value;

use crate::domain::entities::{FormattingMode, OcrResult};

/// Maximum number of characters shown for a metadata value.
pub const METADATA_VALUE_LIMIT: usize = 40;

const ELIDED_TEXT: &str = "...";

/// Turns OCR results into one or two HTML messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter {
    mode: FormattingMode,
}

impl ResponseFormatter {
    /// Creates a formatter for the given mode.
    #[must_use]
    pub const fn new(mode: FormattingMode) -> Self {
        Self { mode }
    }

    /// Renders the result into the HTML bodies to post, in order.
    #[must_use]
    pub fn format(&self, result: &OcrResult) -> Vec<String> {
        match self.mode {
            FormattingMode::Single => vec![render_single(result)],
            FormattingMode::Split => vec![render_metadata_list(result), render_text(result)],
        }
    }
}

fn render_single(result: &OcrResult) -> String {
    let mut html = String::from("<p><strong>Meta:</strong></p>\n<pre><code>");
    for (key, value) in result.metadata() {
        let _ = writeln!(html, "  {}: {}", escape_html(key), metadata_value(value));
    }
    html.push_str("</code></pre>\n<p><strong>Text:</strong></p>\n");
    html.push_str(&render_text(result));
    html
}

fn render_metadata_list(result: &OcrResult) -> String {
    let mut html = String::from("<ul>\n");
    for (key, value) in result.iter() {
        let shown = if key == OcrResult::TEXT_KEY {
            ELIDED_TEXT.to_string()
        } else {
            metadata_value(value)
        };
        let _ = writeln!(html, "<li>{}: {}</li>", escape_html(key), shown);
    }
    html.push_str("</ul>\n");
    html
}

fn render_text(result: &OcrResult) -> String {
    format!("<pre><code>{}</code></pre>\n", escape_html(result.text()))
}

/// Stringifies and truncates a metadata value, then escapes it.
fn metadata_value(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let truncated: String = raw.chars().take(METADATA_VALUE_LIMIT).collect();
    escape_html(&truncated)
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn result(value: Value) -> OcrResult {
        OcrResult::from_value(value).unwrap()
    }

    #[test]
    fn test_single_layout() {
        let formatted = ResponseFormatter::new(FormattingMode::Single)
            .format(&result(json!({ "text": "x^2", "confidence": 0.9 })));

        assert_eq!(formatted.len(), 1);
        assert_eq!(
            formatted[0],
            "<p><strong>Meta:</strong></p>\n<pre><code>  confidence: 0.9\n</code></pre>\n\
             <p><strong>Text:</strong></p>\n<pre><code>x^2</code></pre>\n"
        );
    }

    #[test]
    fn test_split_layout() {
        let formatted = ResponseFormatter::new(FormattingMode::Split).format(&result(json!({
            "request_id": "2024_01_01_abc",
            "text": "x^2",
            "confidence": 0.9
        })));

        assert_eq!(formatted.len(), 2);
        assert_eq!(
            formatted[0],
            "<ul>\n<li>request_id: 2024_01_01_abc</li>\n<li>text: ...</li>\n\
             <li>confidence: 0.9</li>\n</ul>\n"
        );
        assert_eq!(formatted[1], "<pre><code>x^2</code></pre>\n");
    }

    #[test_case(FormattingMode::Single ; "single")]
    #[test_case(FormattingMode::Split ; "split")]
    fn test_long_metadata_truncated_text_untouched(mode: FormattingMode) {
        let long_value = "a".repeat(39) + "bcdefgh";
        let long_text = "\\frac{1}{2} ".repeat(50);
        let formatted = ResponseFormatter::new(mode)
            .format(&result(json!({ "text": long_text, "request_id": long_value })))
            .concat();

        assert!(formatted.contains(&format!("{}b", "a".repeat(39))));
        assert!(!formatted.contains("bc"));
        assert!(formatted.contains(&long_text));
    }

    #[test]
    fn test_non_string_values_stringified_as_json() {
        let formatted = ResponseFormatter::default().format(&result(json!({
            "text": "",
            "is_printed": true,
            "position": { "top_left_x": 0, "top_left_y": 0, "width": 120, "height": 45 }
        })));

        assert!(formatted[0].contains("  is_printed: true\n"));
        assert!(formatted[0].contains("  position: {\"top_left_x\":0,\"top_left_y\":0,\"width\":1\n"));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let value = "é".repeat(45);
        let formatted = ResponseFormatter::default()
            .format(&result(json!({ "text": "t", "note": value })));

        assert!(formatted[0].contains(&format!("  note: {}\n", "é".repeat(40))));
    }

    #[test]
    fn test_html_is_escaped() {
        let formatted = ResponseFormatter::default()
            .format(&result(json!({ "text": "a < b & c > d", "k<ey>": "v&" })));

        assert!(formatted[0].contains("<pre><code>a &lt; b &amp; c &gt; d</code></pre>"));
        assert!(formatted[0].contains("  k&lt;ey&gt;: v&amp;\n"));
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let ocr = result(json!({ "text": "x^2", "confidence": 0.9, "request_id": "r1" }));
        for mode in [FormattingMode::Single, FormattingMode::Split] {
            let formatter = ResponseFormatter::new(mode);
            assert_eq!(formatter.format(&ocr), formatter.format(&ocr));
        }
    }
}
