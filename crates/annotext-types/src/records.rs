use serde::{Deserialize, Serialize};

/// One maximal run of same-colored highlighted text within a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRecord {
    pub filename: String,
    /// Canonical color identifier (e.g. "yellow"), regardless of whether the
    /// source encoded it as a named highlight or a shading fill.
    pub color: String,
    pub text: String,
    /// Sentence containing the span start, or the whole paragraph as fallback.
    pub context: String,
    pub paragraph: String,
    /// Half-open character offsets within the owning paragraph.
    pub offset_start: usize,
    pub offset_end: usize,
    /// Position among body-level paragraphs; `None` for table-cell paragraphs.
    pub para_index: Option<usize>,
}

/// One reviewer comment, joined from the metadata and range-anchor passes.
///
/// In prefix-scan mode there is one record per comment (`codes` carries every
/// accepted token, `label` is always `None`). In pattern-pair mode there is
/// one record per extracted pair (`label` populated, `codes` empty). A comment
/// with no recognized pattern still yields exactly one record with null
/// code/label so the raw text stays visible downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub filename: String,
    pub id: i64,
    pub author: String,
    /// Source timestamp string, not normalized further.
    pub date: String,
    pub text: String,
    /// Document text spanned by the comment's anchor range; empty when the
    /// anchors are missing or malformed.
    pub quoted_text: String,
    pub code: Option<String>,
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<String>,
}

/// An ordered text-bearing block, standalone or inside a table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    pub filename: String,
    /// `None` for table-cell paragraphs, whose order is a secondary traversal.
    pub para_index: Option<usize>,
    pub text: String,
}

/// A single (code, label) extraction from one comment's raw text. Either half
/// may be absent when only part of a pattern matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeLabelPair {
    pub code: Option<String>,
    pub label: Option<String>,
}

/// Derived correlation between one comment and the highlight spans whose text
/// is in a containment relationship with the comment's quoted text. Never
/// persisted; recomputed from the finished highlight and comment collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub filename: String,
    pub comment_id: i64,
    pub author: String,
    pub date: String,
    pub code: Option<String>,
    pub label: Option<String>,
    pub quoted_text: String,
    pub highlight_matches: usize,
    /// Matching highlight texts, deduplicated, sorted, joined with " | ".
    pub highlights_concat: String,
}

/// Full output of one document parse. The same shape doubles as the aggregate
/// union across documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub highlights: Vec<HighlightRecord>,
    pub comments: Vec<CommentRecord>,
    pub paragraphs: Vec<ParagraphRecord>,
}

impl ParsedDocument {
    /// Merge another document's records into this aggregate.
    pub fn extend(&mut self, other: ParsedDocument) {
        self.highlights.extend(other.highlights);
        self.comments.extend(other.comments);
        self.paragraphs.extend(other.paragraphs);
    }
}
