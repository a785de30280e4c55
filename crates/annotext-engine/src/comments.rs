//! Comment extraction: a metadata pass over the comments part and a
//! range-anchor pass over the document body, joined later by comment id.

use std::collections::HashMap;

use crate::wml::{gather_text, is_wml, wml_attr, wml_id};

/// One comment's identity and authored text, from the comments part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentMeta {
    pub id: i64,
    pub author: String,
    /// Source timestamp string, kept as-is.
    pub date: String,
    pub text: String,
}

/// Parse the comments part. Entries without a usable integer id carry no
/// identity and are skipped.
pub fn comment_metadata(doc: &roxmltree::Document) -> Vec<CommentMeta> {
    let mut out = Vec::new();
    for node in doc.descendants().filter(|n| is_wml(*n, "comment")) {
        let Some(id) = wml_id(node) else {
            tracing::warn!("skipping comment entry without a parseable id");
            continue;
        };
        out.push(CommentMeta {
            id,
            author: wml_attr(node, "author").unwrap_or_default().to_string(),
            date: wml_attr(node, "date").unwrap_or_default().to_string(),
            text: gather_text(node).trim().to_string(),
        });
    }
    out
}

/// Walk the document body once in document order, accumulating the text
/// spanned by each comment's range markers. Ranges may nest or overlap, so
/// several ids can be open at the same time; an end marker with no matching
/// open start is ignored. Only ids whose accumulated text is non-empty after
/// trimming survive.
pub fn quoted_spans(doc: &roxmltree::Document) -> HashMap<i64, String> {
    let mut open: Vec<i64> = Vec::new();
    let mut acc: HashMap<i64, String> = HashMap::new();

    let Some(body) = doc.descendants().find(|n| is_wml(*n, "body")) else {
        return acc;
    };

    for node in body.descendants() {
        if is_wml(node, "commentRangeStart") {
            if let Some(id) = wml_id(node) {
                open.push(id);
                acc.entry(id).or_default();
            }
        } else if is_wml(node, "commentRangeEnd") {
            if let Some(id) = wml_id(node) {
                if let Some(pos) = open.iter().position(|&x| x == id) {
                    open.remove(pos);
                }
            }
        } else if is_wml(node, "t") && !open.is_empty() {
            if let Some(text) = node.text() {
                for id in &open {
                    if let Some(buf) = acc.get_mut(id) {
                        buf.push_str(text);
                    }
                }
            }
        }
    }

    acc.retain(|_, v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return false;
        }
        *v = trimmed.to_string();
        true
    });
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn parse(xml: &str) -> roxmltree::Document<'_> {
        roxmltree::Document::parse(xml).unwrap()
    }

    #[test]
    fn metadata_pass_reads_identity_and_joined_text() {
        let xml = format!(
            r#"<w:comments {NS}>
                <w:comment w:id="2" w:author="anna" w:date="2024-03-01T10:00:00Z">
                    <w:p><w:r><w:t>CE_P </w:t></w:r><w:r><w:t>project</w:t></w:r></w:p>
                </w:comment>
                <w:comment w:author="no-id"><w:p><w:r><w:t>dropped</w:t></w:r></w:p></w:comment>
            </w:comments>"#
        );
        let metas = comment_metadata(&parse(&xml));

        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].id, 2);
        assert_eq!(metas[0].author, "anna");
        assert_eq!(metas[0].date, "2024-03-01T10:00:00Z");
        assert_eq!(metas[0].text, "CE_P project");
    }

    #[test]
    fn range_pass_accumulates_text_between_markers() {
        let xml = format!(
            r#"<w:document {NS}><w:body><w:p>
                <w:r><w:t>before </w:t></w:r>
                <w:commentRangeStart w:id="1"/>
                <w:r><w:t>quoted text</w:t></w:r>
                <w:commentRangeEnd w:id="1"/>
                <w:r><w:t> after</w:t></w:r>
            </w:p></w:body></w:document>"#
        );
        let spans = quoted_spans(&parse(&xml));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[&1], "quoted text");
    }

    #[test]
    fn overlapping_ranges_each_collect_their_own_text() {
        let xml = format!(
            r#"<w:document {NS}><w:body><w:p>
                <w:commentRangeStart w:id="1"/>
                <w:r><w:t>one </w:t></w:r>
                <w:commentRangeStart w:id="2"/>
                <w:r><w:t>shared</w:t></w:r>
                <w:commentRangeEnd w:id="1"/>
                <w:r><w:t> two</w:t></w:r>
                <w:commentRangeEnd w:id="2"/>
            </w:p></w:body></w:document>"#
        );
        let spans = quoted_spans(&parse(&xml));

        assert_eq!(spans[&1], "one shared");
        assert_eq!(spans[&2], "shared two");
    }

    #[test]
    fn orphaned_end_marker_is_ignored() {
        let xml = format!(
            r#"<w:document {NS}><w:body><w:p>
                <w:commentRangeEnd w:id="9"/>
                <w:r><w:t>untouched</w:t></w:r>
            </w:p></w:body></w:document>"#
        );
        assert!(quoted_spans(&parse(&xml)).is_empty());
    }

    #[test]
    fn whitespace_only_ranges_are_dropped() {
        let xml = format!(
            r#"<w:document {NS}><w:body><w:p>
                <w:commentRangeStart w:id="3"/>
                <w:r><w:t>   </w:t></w:r>
                <w:commentRangeEnd w:id="3"/>
            </w:p></w:body></w:document>"#
        );
        assert!(quoted_spans(&parse(&xml)).is_empty());
    }
}
