//! Remote document structure
//!
//! The subset of a `documents.get` response the core reads: body content,
//! paragraph text runs and tables. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Fetched document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Remote id
    #[serde(default)]
    pub document_id: String,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Body, absent for some partial responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

/// Document body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-level structural elements in document order
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// Top-level element of the body or of a table cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    /// First index (omitted by the API when zero)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,
    /// One past the last index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<i64>,
    /// Paragraph payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<Paragraph>,
    /// Table payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
}

/// Paragraph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Inline elements
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

/// Inline element of a paragraph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    /// First index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,
    /// One past the last index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<i64>,
    /// Text payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
}

/// Run of uniformly styled text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Text, including any trailing newline
    #[serde(default)]
    pub content: String,
}

/// Table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Row count
    #[serde(default)]
    pub rows: usize,
    /// Column count
    #[serde(default)]
    pub columns: usize,
    /// Rows in order
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

/// Table row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// Cells in order
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

/// Table cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content, at least one paragraph
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// Paragraph-level text run with its start index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRunRef<'a> {
    /// Start index of the run
    pub start_index: i64,
    /// Run text
    pub content: &'a str,
}

impl Document {
    /// Body content, empty when the body is absent
    #[must_use]
    pub fn content(&self) -> &[StructuralElement] {
        self.body.as_ref().map_or(&[][..], |b| b.content.as_slice())
    }

    /// Text runs of top-level paragraphs, in document order
    pub fn text_runs(&self) -> impl Iterator<Item = TextRunRef<'_>> {
        self.content()
            .iter()
            .filter_map(|element| element.paragraph.as_ref())
            .flat_map(|paragraph| paragraph.elements.iter())
            .filter_map(|element| {
                element.text_run.as_ref().map(|run| TextRunRef {
                    start_index: element.start_index.unwrap_or(0),
                    content: run.content.as_str(),
                })
            })
    }

    /// Top-level tables, in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.content().iter().filter_map(|e| e.table.as_ref())
    }

    /// Build a document from body elements
    #[must_use]
    pub fn with_content(document_id: impl Into<String>, content: Vec<StructuralElement>) -> Self {
        Self {
            document_id: document_id.into(),
            title: String::new(),
            body: Some(Body { content }),
        }
    }
}

impl StructuralElement {
    /// Single-run paragraph starting at `start`
    #[must_use]
    pub fn paragraph(start: i64, text: &str) -> Self {
        let end = start + utf16_len(text);
        Self {
            start_index: Some(start),
            end_index: Some(end),
            paragraph: Some(Paragraph {
                elements: vec![ParagraphElement {
                    start_index: Some(start),
                    end_index: Some(end),
                    text_run: Some(TextRun {
                        content: text.to_string(),
                    }),
                }],
            }),
            table: None,
        }
    }

    /// Leading section break, which occupies `[0, 1)`
    #[must_use]
    pub fn section_break() -> Self {
        Self {
            start_index: None,
            end_index: Some(1),
            paragraph: None,
            table: None,
        }
    }
}

/// Length of `text` in the API's index units (UTF-16 code units)
#[inline]
#[must_use]
pub fn utf16_len(text: &str) -> i64 {
    i64::try_from(text.encode_utf16().count()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_api_shape() {
        let raw = r#"{
            "documentId": "abc",
            "title": "Report",
            "revisionId": "ignored",
            "body": {"content": [
                {"endIndex": 1, "sectionBreak": {}},
                {"startIndex": 1, "endIndex": 7, "paragraph": {"elements": [
                    {"startIndex": 1, "endIndex": 7, "textRun": {"content": "Hello\n", "textStyle": {}}}
                ]}}
            ]}
        }"#;
        let doc: Document = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.document_id, "abc");
        assert_eq!(doc.content().len(), 2);

        let runs: Vec<_> = doc.text_runs().collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].start_index, 1);
        assert_eq!(runs[0].content, "Hello\n");
    }

    #[test]
    fn missing_body_has_no_content() {
        let doc: Document = serde_json::from_str(r#"{"documentId": "x"}"#).unwrap();
        assert!(doc.content().is_empty());
        assert_eq!(doc.text_runs().count(), 0);
        assert_eq!(doc.tables().count(), 0);
    }

    #[test]
    fn utf16_length_counts_surrogate_pairs() {
        assert_eq!(utf16_len("abc"), 3);
        assert_eq!(utf16_len("é"), 1);
        assert_eq!(utf16_len("😀"), 2);
    }

    #[test]
    fn paragraph_builder_indices() {
        let p = StructuralElement::paragraph(5, "ab\n");
        assert_eq!(p.start_index, Some(5));
        assert_eq!(p.end_index, Some(8));
    }
}
