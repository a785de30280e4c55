//! Extraction engine for annotations in OOXML wordprocessing packages.
//!
//! One call to [`Extractor::parse`] turns a document's raw bytes into flat,
//! immutable record collections: highlight spans reconstructed from the
//! fragmented run model, reviewer comments joined from the metadata and
//! range-anchor passes, and every paragraph's text. Each document is a pure
//! function of its bytes; batches may be processed in parallel per document.

pub mod codes;
pub mod color;
pub mod comments;
pub mod correlate;
pub mod error;
pub mod highlight;
pub mod package;
mod wml;

pub use codes::{CodeExtractor, CodeScheme, PatternPairParser, PrefixScanner};
pub use error::ExtractError;
pub use package::DocxPackage;

use std::collections::HashMap;

use annotext_types::{CommentRecord, LinkRecord, ParsedDocument};

use comments::CommentMeta;

/// Engine entry point, configured with the code-extraction scheme.
pub struct Extractor {
    scheme: CodeScheme,
}

impl Extractor {
    pub fn new(scheme: CodeScheme) -> Self {
        Self { scheme }
    }

    /// Parse one document package into its flat record collections.
    pub fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedDocument, ExtractError> {
        let pkg = DocxPackage::open(bytes)?;
        let body = roxmltree::Document::parse(wml::strip_bom(&pkg.document_xml))?;

        let (highlights, paragraphs) = highlight::extract(&body, filename);
        let quoted = comments::quoted_spans(&body);

        // A damaged comments part degrades to "no comments" rather than
        // failing a document whose body parsed cleanly.
        let metas = match &pkg.comments_xml {
            Some(xml) => match roxmltree::Document::parse(wml::strip_bom(xml)) {
                Ok(doc) => comments::comment_metadata(&doc),
                Err(e) => {
                    tracing::warn!("{filename}: unreadable comments part: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut records = Vec::new();
        for meta in &metas {
            records.extend(expand_comment(meta, &quoted, filename, self.scheme));
        }

        Ok(ParsedDocument {
            highlights,
            comments: records,
            paragraphs,
        })
    }

    /// Correlate each comment record with the highlight spans of the same
    /// document. Derived output; nothing in `parsed` is modified.
    pub fn link(&self, parsed: &ParsedDocument) -> Vec<LinkRecord> {
        correlate::link_comments(&parsed.highlights, &parsed.comments)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(CodeScheme::default())
    }
}

/// Expand one comment's metadata into output records under the chosen scheme.
///
/// Prefix scan: always exactly one record, `code` being the first accepted
/// token and `codes` the full ordered list. Pattern pairs: one record per
/// extracted pair, or a single record with null code/label when nothing
/// matched, so the raw text is never dropped.
fn expand_comment(
    meta: &CommentMeta,
    quoted: &HashMap<i64, String>,
    filename: &str,
    scheme: CodeScheme,
) -> Vec<CommentRecord> {
    let quoted_text = quoted.get(&meta.id).cloned().unwrap_or_default();
    let base = CommentRecord {
        filename: filename.to_string(),
        id: meta.id,
        author: meta.author.clone(),
        date: meta.date.clone(),
        text: meta.text.clone(),
        quoted_text,
        code: None,
        label: None,
        codes: Vec::new(),
    };

    match scheme {
        CodeScheme::PrefixScan => {
            let found = PrefixScanner::scan(&meta.text);
            vec![CommentRecord {
                code: found.first().cloned(),
                codes: found,
                ..base
            }]
        }
        CodeScheme::PatternPairs => {
            let pairs = PatternPairParser.extract(&meta.text);
            if pairs.is_empty() {
                return vec![base];
            }
            pairs
                .into_iter()
                .map(|pair| CommentRecord {
                    code: pair.code,
                    label: pair.label,
                    ..base.clone()
                })
                .collect()
        }
    }
}
