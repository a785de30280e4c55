//! Highlight span reconstruction.
//!
//! A single logically highlighted phrase is frequently split into several
//! runs by formatting boundaries invisible to the color, so adjacent runs
//! with the same normalized color are merged back into one span while a
//! running character offset tracks its position inside the paragraph.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use roxmltree::Node;

use annotext_types::{HighlightRecord, ParagraphRecord};

use crate::color::normalize_run_color;
use crate::wml::{is_wml, wml_attr, wml_child};

/// One run's text together with its normalized color signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub color: Option<String>,
}

/// A paragraph's ordered runs plus its body-level position, when it has one.
#[derive(Debug, Clone)]
pub struct ParagraphSource {
    pub runs: Vec<Run>,
    /// `None` for table-cell paragraphs.
    pub para_index: Option<usize>,
}

impl ParagraphSource {
    /// Full paragraph text: the concatenation of its runs, which keeps span
    /// offsets consistent with run iteration order by construction.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Collect paragraphs in extraction order: body-level paragraphs first
/// (indexed by document position), then table-cell paragraphs (unindexed).
/// Paragraph nodes shared across merged cells are visited once.
pub fn collect_paragraphs(doc: &roxmltree::Document) -> Vec<ParagraphSource> {
    let mut out = Vec::new();
    let Some(body) = doc.descendants().find(|n| is_wml(*n, "body")) else {
        return out;
    };

    let mut index = 0usize;
    for node in body.children().filter(|n| is_wml(*n, "p")) {
        out.push(paragraph_source(node, Some(index)));
        index += 1;
    }

    for table in body.children().filter(|n| is_wml(*n, "tbl")) {
        let mut seen = HashSet::new();
        for row in table.children().filter(|n| is_wml(*n, "tr")) {
            for cell in row.children().filter(|n| is_wml(*n, "tc")) {
                for para in cell.children().filter(|n| is_wml(*n, "p")) {
                    if !seen.insert(para.id().get()) {
                        continue;
                    }
                    out.push(paragraph_source(para, None));
                }
            }
        }
    }

    out
}

fn paragraph_source(para: Node, para_index: Option<usize>) -> ParagraphSource {
    let runs = para
        .descendants()
        .filter(|n| is_wml(*n, "r"))
        .map(|run| {
            let props = wml_child(run, "rPr");
            let highlight = props
                .and_then(|p| wml_child(p, "highlight"))
                .and_then(|h| wml_attr(h, "val"));
            let shading = props.and_then(|p| wml_child(p, "shd"));
            let fill = shading.and_then(|s| wml_attr(s, "fill"));
            let theme_fill = shading.and_then(|s| wml_attr(s, "themeFill"));
            Run {
                text: crate::wml::gather_text(run),
                color: normalize_run_color(highlight, fill, theme_fill),
            }
        })
        .collect();
    ParagraphSource { runs, para_index }
}

/// Merge a paragraph's runs into maximal same-color spans.
pub fn build_spans(para: &ParagraphSource, para_text: &str, filename: &str) -> Vec<HighlightRecord> {
    let mut spans = Vec::new();
    let mut offset = 0usize;
    let mut buf = String::new();
    let mut buf_color: Option<String> = None;
    let mut buf_start = 0usize;

    for run in &para.runs {
        if run.text.is_empty() {
            continue;
        }
        if run.color.is_some() && run.color == buf_color {
            buf.push_str(&run.text);
        } else if let Some(color) = run.color.clone() {
            flush_span(&mut spans, filename, para, para_text, &buf_color, &buf, buf_start);
            buf_color = Some(color);
            buf_start = offset;
            buf.clear();
            buf.push_str(&run.text);
        } else {
            flush_span(&mut spans, filename, para, para_text, &buf_color, &buf, buf_start);
            buf_color = None;
            buf.clear();
        }
        offset += run.text.chars().count();
    }
    flush_span(&mut spans, filename, para, para_text, &buf_color, &buf, buf_start);

    spans
}

fn flush_span(
    out: &mut Vec<HighlightRecord>,
    filename: &str,
    para: &ParagraphSource,
    para_text: &str,
    color: &Option<String>,
    buf: &str,
    start: usize,
) {
    let Some(color) = color else { return };
    // Whitespace-only runs never count as highlights.
    if buf.trim().is_empty() {
        return;
    }
    out.push(HighlightRecord {
        filename: filename.to_string(),
        color: color.clone(),
        text: buf.to_string(),
        context: sentence_window(para_text, start),
        paragraph: para_text.to_string(),
        offset_start: start,
        offset_end: start + buf.chars().count(),
        para_index: para.para_index,
    });
}

lazy_static! {
    // Sentence-terminal punctuation followed by whitespace.
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

/// First sentence segment whose cumulative character range contains
/// `start_index`; the whole paragraph when the arithmetic runs past the last
/// segment.
pub fn sentence_window(text: &str, start_index: usize) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut last = 0usize;
    for m in SENTENCE_BREAK.find_iter(text) {
        // The terminal punctuation is a single ASCII byte; keep it with its
        // sentence and drop the separating whitespace.
        parts.push(&text[last..m.start() + 1]);
        last = m.end();
    }
    parts.push(&text[last..]);

    let mut cum = 0usize;
    for part in &parts {
        let len = part.chars().count();
        if cum <= start_index && start_index < cum + len + 1 {
            return part.trim().to_string();
        }
        cum += len + 1;
    }
    text.trim().to_string()
}

/// Extract all highlight spans and paragraph records from a parsed body.
pub fn extract(
    doc: &roxmltree::Document,
    filename: &str,
) -> (Vec<HighlightRecord>, Vec<ParagraphRecord>) {
    let mut highlights = Vec::new();
    let mut paragraphs = Vec::new();

    for para in collect_paragraphs(doc) {
        let para_text = para.text();
        paragraphs.push(ParagraphRecord {
            filename: filename.to_string(),
            para_index: para.para_index,
            text: para_text.clone(),
        });
        if para_text.trim().is_empty() {
            continue;
        }
        highlights.extend(build_spans(&para, &para_text, filename));
    }

    (highlights, paragraphs)
}
