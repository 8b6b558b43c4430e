//! Conversion of adapter payloads into a single textual representation.

use crate::sources::DocumentPayload;
use serde_json::Value;

/// Maximum number of characters included in a caller-facing preview.
pub const PREVIEW_LIMIT: usize = 1000;

const PREVIEW_ELLIPSIS: &str = "...";
const CELL_DELIMITER: &str = ", ";

/// Single-string rendition of a document payload.
///
/// Normalization itself never truncates; `truncated` only becomes true on
/// the preview produced for outward responses. The full text is always the
/// value handed to the completion gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    /// Normalized content.
    pub text: String,
    /// Character count of the normalized content.
    pub original_length: usize,
    /// Whether `text` was cut down for display.
    pub truncated: bool,
}

impl NormalizedText {
    /// Produce the caller-facing preview, cut to [`PREVIEW_LIMIT`] characters.
    pub fn preview(&self) -> NormalizedText {
        if self.original_length <= PREVIEW_LIMIT {
            return self.clone();
        }
        let mut text: String = self.text.chars().take(PREVIEW_LIMIT).collect();
        text.push_str(PREVIEW_ELLIPSIS);
        NormalizedText {
            text,
            original_length: self.original_length,
            truncated: true,
        }
    }
}

/// Convert a payload into its normalized text form.
pub fn normalize(payload: DocumentPayload) -> NormalizedText {
    let text = match payload {
        DocumentPayload::Text(text) => text,
        DocumentPayload::Table(rows) => render_table(&rows),
    };
    NormalizedText {
        original_length: text.chars().count(),
        truncated: false,
        text,
    }
}

/// Render rows as one comma-joined line each, provider order preserved.
fn render_table(rows: &[Vec<Value>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(stringify_cell)
                .collect::<Vec<_>>()
                .join(CELL_DELIMITER)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn stringify_cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_passes_through_unchanged() {
        let normalized = normalize(DocumentPayload::Text("Hello docs".into()));
        assert_eq!(normalized.text, "Hello docs");
        assert_eq!(normalized.original_length, 10);
        assert!(!normalized.truncated);
    }

    #[test]
    fn table_rows_join_with_comma_and_newline() {
        let payload = DocumentPayload::Table(vec![
            vec![json!(1), json!("a")],
            vec![json!(2), json!("b")],
        ]);
        assert_eq!(normalize(payload).text, "1, a\n2, b");
    }

    #[test]
    fn table_cells_stringify_losslessly() {
        let payload = DocumentPayload::Table(vec![vec![
            json!("text"),
            json!(3.25),
            json!(true),
            json!(null),
        ]]);
        assert_eq!(normalize(payload).text, "text, 3.25, true, ");
    }

    #[test]
    fn empty_table_normalizes_to_empty_string() {
        let normalized = normalize(DocumentPayload::Table(Vec::new()));
        assert_eq!(normalized.text, "");
        assert_eq!(normalized.original_length, 0);
    }

    #[test]
    fn preview_truncates_long_text_but_keeps_original_length() {
        let normalized = normalize(DocumentPayload::Text("x".repeat(1500)));
        let preview = normalized.preview();

        assert_eq!(preview.text.chars().count(), PREVIEW_LIMIT + 3);
        assert!(preview.text.ends_with("..."));
        assert!(preview.truncated);
        assert_eq!(preview.original_length, 1500);
        // the value fed downstream stays complete
        assert_eq!(normalized.text.chars().count(), 1500);
        assert!(!normalized.truncated);
    }

    #[test]
    fn preview_leaves_short_text_alone() {
        let normalized = normalize(DocumentPayload::Text("short".into()));
        let preview = normalized.preview();
        assert_eq!(preview.text, "short");
        assert!(!preview.truncated);
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let normalized = normalize(DocumentPayload::Text("é".repeat(1200)));
        let preview = normalized.preview();
        assert_eq!(preview.text.chars().count(), PREVIEW_LIMIT + 3);
        assert!(preview.truncated);
    }
}
