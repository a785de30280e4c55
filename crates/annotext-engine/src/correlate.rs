//! Fuzzy correlation of comments with highlight spans.
//!
//! A comment's anchor range and a highlight span are computed independently
//! and rarely align exactly, so the link is a heuristic: after collapsing
//! whitespace, either text containing the other counts as a match. Scoped to
//! one document; a comment never links across documents.

use lazy_static::lazy_static;
use regex::Regex;

use annotext_types::{CommentRecord, HighlightRecord, LinkRecord};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

fn collapse_ws(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Highlight texts matching one comment's quoted text, in highlight order.
/// Empty quoted text matches nothing.
pub fn matching_highlights(
    quoted: &str,
    filename: &str,
    highlights: &[HighlightRecord],
) -> Vec<String> {
    let quoted_norm = collapse_ws(quoted);
    if quoted_norm.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for span in highlights.iter().filter(|h| h.filename == filename) {
        let span_text = span.text.trim();
        if span_text.is_empty() {
            continue;
        }
        let span_norm = collapse_ws(span_text);
        if span_norm.contains(&quoted_norm) || quoted_norm.contains(&span_norm) {
            matches.push(span_text.to_string());
        }
    }
    matches
}

/// Build one link record per comment record. The match count reflects every
/// matching span; the joined text is deduplicated and sorted so output is
/// deterministic.
pub fn link_comments(
    highlights: &[HighlightRecord],
    comments: &[CommentRecord],
) -> Vec<LinkRecord> {
    comments
        .iter()
        .map(|comment| {
            let matches =
                matching_highlights(&comment.quoted_text, &comment.filename, highlights);
            let mut unique: Vec<String> = matches.clone();
            unique.sort();
            unique.dedup();
            LinkRecord {
                filename: comment.filename.clone(),
                comment_id: comment.id,
                author: comment.author.clone(),
                date: comment.date.clone(),
                code: comment.code.clone(),
                label: comment.label.clone(),
                quoted_text: comment.quoted_text.trim().to_string(),
                highlight_matches: matches.len(),
                highlights_concat: unique.join(" | "),
            }
        })
        .collect()
}
