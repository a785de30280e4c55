//! Classification-code extraction from free-form comment text.
//!
//! Two strategies exist because the observed annotation corpora use two
//! conventions: a structured multi-pair micro-format (markup-like tags,
//! key=value declarations, line-based `CODE: label` forms) and a looser
//! "bare token with a known prefix" convention. Which one is authoritative
//! is a per-deployment choice, so both live behind [`CodeExtractor`] and
//! callers pick a [`CodeScheme`].

use lazy_static::lazy_static;
use regex::Regex;

use annotext_types::CodeLabelPair;

/// Code prefixes accepted by the bare-token scanner.
pub const VALID_PREFIXES: &[&str] = &["CE", "CS", "BE", "IN", "CC", "A"];

/// A pluggable extraction strategy over one comment's raw text.
pub trait CodeExtractor: Send + Sync {
    /// Extract zero or more (code, label) pairs. Pure: identical input text
    /// always yields the same ordered, deduplicated list.
    fn extract(&self, text: &str) -> Vec<CodeLabelPair>;
}

/// Strategy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodeScheme {
    /// Bare uppercase tokens filtered by [`VALID_PREFIXES`]; the first
    /// accepted token is "the" code.
    #[default]
    PrefixScan,
    /// Structured multi-pair parser; one output pair per match.
    PatternPairs,
}

impl CodeScheme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scan" => Some(CodeScheme::PrefixScan),
            "pairs" => Some(CodeScheme::PatternPairs),
            _ => None,
        }
    }
}

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\b[A-Z]{1,4}(?:_[A-Z]{1,4})?\b").unwrap();
    static ref TAG_PAIR: Regex = Regex::new(
        r"(?is)<\s*codice\s*>(.*?)<\s*/?\\?\s*codice\s*>\s*<\s*commento\s*>(.*?)<\s*/?\\?\s*commento\s*>"
    )
    .unwrap();
    static ref KEY_VALUE: Regex = Regex::new(
        r"(?i)(?:codice|code)\s*=\s*([A-Za-z0-9_]+)(?:;|,|\||\n|\r|\s)+(?:commento|label)\s*=\s*([^;,|\n\r]+)"
    )
    .unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[;|]+").unwrap();
    static ref BRACKETED: Regex = Regex::new(r"^\[\s*([A-Za-z0-9_]+)\s*\]\s+(.+)$").unwrap();
    static ref CODE_LABEL: Regex = Regex::new(r"^([A-Za-z0-9_]+)\s*[:\-–]\s*(.+)$").unwrap();
}

/// Bare-token scanner: uppercase tokens whose prefix (the part before `_`)
/// is in the allow-list, deduplicated in first-seen order.
pub struct PrefixScanner;

impl PrefixScanner {
    /// All accepted tokens, in order.
    pub fn scan(text: &str) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for token in TOKEN.find_iter(text) {
            let normalized = token.as_str().trim().to_uppercase();
            if normalized.is_empty() {
                continue;
            }
            let prefix = normalized.split('_').next().unwrap_or(&normalized);
            if !VALID_PREFIXES.contains(&prefix) {
                continue;
            }
            if codes.iter().any(|c| c == &normalized) {
                continue;
            }
            codes.push(normalized);
        }
        codes
    }
}

impl CodeExtractor for PrefixScanner {
    fn extract(&self, text: &str) -> Vec<CodeLabelPair> {
        Self::scan(text)
            .into_iter()
            .map(|code| CodeLabelPair {
                code: Some(code),
                label: None,
            })
            .collect()
    }
}

/// Structured multi-pair parser supporting markup-like tags, key=value
/// declarations, and line-based code/label forms.
pub struct PatternPairParser;

impl CodeExtractor for PatternPairParser {
    fn extract(&self, text: &str) -> Vec<CodeLabelPair> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<(Option<String>, Option<String>)> = Vec::new();

        // 1) Markup-like tag pairs, possibly repeated.
        for caps in TAG_PAIR.captures_iter(trimmed) {
            push_pair(&mut results, &caps[1], &caps[2]);
        }

        // 2) key=value declarations, possibly repeated.
        for caps in KEY_VALUE.captures_iter(trimmed) {
            push_pair(&mut results, &caps[1], &caps[2]);
        }

        // 3) Per line, after folding ;/| separators into line breaks:
        //    "[CODE] label" first, then "CODE : label" / "CODE - label".
        let normalized = SEPARATORS.replace_all(trimmed, "\n");
        for line in normalized.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(caps) = BRACKETED.captures(line) {
                push_pair(&mut results, &caps[1], &caps[2]);
            } else if let Some(caps) = CODE_LABEL.captures(line) {
                push_pair(&mut results, &caps[1], &caps[2]);
            }
        }

        dedup_pairs(results)
    }
}

fn push_pair(results: &mut Vec<(Option<String>, Option<String>)>, code: &str, label: &str) {
    let code = code.trim();
    let label = label.trim();
    if code.is_empty() && label.is_empty() {
        return;
    }
    results.push((
        (!code.is_empty()).then(|| code.to_string()),
        (!label.is_empty()).then(|| label.to_string()),
    ));
}

/// Deduplicate by the (code, label) tuple, preserving first-seen order.
fn dedup_pairs(results: Vec<(Option<String>, Option<String>)>) -> Vec<CodeLabelPair> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for (code, label) in results {
        let key = (
            code.clone().unwrap_or_default(),
            label.clone().unwrap_or_default(),
        );
        if seen.insert(key) {
            out.push(CodeLabelPair { code, label });
        }
    }
    out
}
