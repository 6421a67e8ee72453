//! Edit operations
//!
//! Each variant is one atomic request of a `documents.batchUpdate` call and
//! serializes to the request shape the Docs API expects, e.g.
//! `{"insertText": {"location": {"index": 1}, "text": "hi"}}`.
//!
//! Operations are pure data. Indices inside one batch are not adjusted for
//! the side effects of earlier operations in the same batch.

use serde::{Deserialize, Serialize};

/// Position in the document body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Offset in UTF-16 code units
    pub index: i64,
}

/// End of the document body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOfSegmentLocation {
    /// Segment id; absent means the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
}

/// Half-open index range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    /// First index covered
    pub start_index: i64,
    /// First index not covered
    pub end_index: i64,
}

/// Named paragraph style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    /// e.g. `HEADING_1`, `NORMAL_TEXT`
    pub named_style_type: String,
}

/// Length with unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Amount
    pub magnitude: f64,
    /// Unit, `PT` for points
    pub unit: String,
}

impl Dimension {
    /// Length in points
    #[must_use]
    pub fn points(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: "PT".to_string(),
        }
    }
}

/// Object size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Height
    pub height: Dimension,
    /// Width
    pub width: Dimension,
}

/// Literal text match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstringMatchCriteria {
    /// Text to find
    pub text: String,
    /// Case-sensitive match
    pub match_case: bool,
}

/// One atomic document edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditOperation {
    /// Insert text at an index
    #[serde(rename = "insertText")]
    InsertText {
        /// Where to insert
        location: Location,
        /// Text to insert
        text: String,
    },

    /// Apply a named paragraph style over a range
    #[serde(rename = "updateParagraphStyle", rename_all = "camelCase")]
    SetParagraphStyle {
        /// Paragraphs touched by this range are restyled
        range: Range,
        /// Style to apply
        paragraph_style: ParagraphStyle,
        /// Field mask
        fields: String,
    },

    /// Insert an inline image fetched from a URI
    #[serde(rename = "insertInlineImage", rename_all = "camelCase")]
    InsertImage {
        /// Where to insert
        location: Location,
        /// Publicly reachable image URI
        uri: String,
        /// Rendered size
        object_size: Size,
    },

    /// Insert a page break
    #[serde(rename = "insertPageBreak")]
    InsertPageBreak {
        /// Where to insert
        location: Location,
    },

    /// Replace every occurrence of a string in the document
    #[serde(rename = "replaceAllText", rename_all = "camelCase")]
    ReplaceText {
        /// What to match
        contains_text: SubstringMatchCriteria,
        /// Replacement text
        replace_text: String,
    },

    /// Insert an empty table
    #[serde(rename = "insertTable", rename_all = "camelCase")]
    InsertTable {
        /// Explicit position
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<Location>,
        /// Append at end of body
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_of_segment_location: Option<EndOfSegmentLocation>,
        /// Row count
        rows: usize,
        /// Column count
        columns: usize,
    },

    /// Delete a range of content
    #[serde(rename = "deleteContentRange")]
    DeleteContentRange {
        /// Range to delete
        range: Range,
    },
}

impl EditOperation {
    /// Insert `text` at `index`
    pub fn insert_text(index: i64, text: impl Into<String>) -> Self {
        Self::InsertText {
            location: Location { index },
            text: text.into(),
        }
    }

    /// Restyle `[start, end)` as `HEADING_{level}`
    #[must_use]
    pub fn heading_style(start: i64, end: i64, level: u8) -> Self {
        Self::SetParagraphStyle {
            range: Range {
                start_index: start,
                end_index: end,
            },
            paragraph_style: ParagraphStyle {
                named_style_type: format!("HEADING_{level}"),
            },
            fields: "namedStyleType".to_string(),
        }
    }

    /// Insert image from `uri` at `index`
    pub fn insert_image(index: i64, uri: impl Into<String>, object_size: Size) -> Self {
        Self::InsertImage {
            location: Location { index },
            uri: uri.into(),
            object_size,
        }
    }

    /// Insert page break at `index`
    #[must_use]
    pub fn insert_page_break(index: i64) -> Self {
        Self::InsertPageBreak {
            location: Location { index },
        }
    }

    /// Replace all case-sensitive occurrences of `pattern`
    pub fn replace_all(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::ReplaceText {
            contains_text: SubstringMatchCriteria {
                text: pattern.into(),
                match_case: true,
            },
            replace_text: replacement.into(),
        }
    }

    /// Append an empty `rows` x `columns` table to the body
    #[must_use]
    pub fn append_table(rows: usize, columns: usize) -> Self {
        Self::InsertTable {
            location: None,
            end_of_segment_location: Some(EndOfSegmentLocation::default()),
            rows,
            columns,
        }
    }

    /// Delete `[start, end)`
    #[must_use]
    pub fn delete_range(start: i64, end: i64) -> Self {
        Self::DeleteContentRange {
            range: Range {
                start_index: start,
                end_index: end,
            },
        }
    }

    /// Request name on the wire
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsertText { .. } => "insertText",
            Self::SetParagraphStyle { .. } => "updateParagraphStyle",
            Self::InsertImage { .. } => "insertInlineImage",
            Self::InsertPageBreak { .. } => "insertPageBreak",
            Self::ReplaceText { .. } => "replaceAllText",
            Self::InsertTable { .. } => "insertTable",
            Self::DeleteContentRange { .. } => "deleteContentRange",
        }
    }
}
