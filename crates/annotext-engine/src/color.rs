//! Normalization of the two highlight-color encodings into one canonical
//! name space.
//!
//! Runs can carry a named highlight (`w:highlight w:val="yellow"`) or, when
//! that is absent, a shading fill (`w:shd w:fill="FFFF00"` or a theme fill
//! token). Both encodings of the same color must normalize identically so
//! downstream grouping and filtering see a single identifier.

/// Canonical name for a known hex triple, matching the standard highlighter
/// palette used by the named enumeration.
fn hex_to_name(hex: &str) -> Option<&'static str> {
    match hex {
        "000000" => Some("black"),
        "0000ff" => Some("blue"),
        "00ffff" => Some("cyan"),
        "000080" => Some("darkblue"),
        "008080" => Some("darkcyan"),
        "808080" => Some("darkgray"),
        "008000" => Some("darkgreen"),
        "800080" => Some("darkmagenta"),
        "800000" => Some("darkred"),
        "808000" => Some("darkyellow"),
        "00ff00" => Some("green"),
        "c0c0c0" => Some("lightgray"),
        "ff00ff" => Some("magenta"),
        "ff0000" => Some("red"),
        "ffffff" => Some("white"),
        "ffff00" => Some("yellow"),
        _ => None,
    }
}

/// Normalize a single raw color token from either encoding. Returns `None`
/// for absent/empty signals and for fills explicitly marked `auto`, both of
/// which mean "this run carries no highlight".
pub fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Enumeration-style values may arrive dotted, e.g. "COLOR_INDEX.YELLOW".
    let tail = trimmed.rsplit('.').next().unwrap_or(trimmed);
    let tail = tail.strip_prefix('#').unwrap_or(tail);
    let mut token = tail.trim().to_lowercase();
    if token.is_empty() || token == "auto" || token == "none" {
        return None;
    }

    // Hex plus alpha channel: keep the leading color triple.
    if token.len() == 8 && token.chars().all(|c| c.is_ascii_hexdigit()) {
        token.truncate(6);
    }
    if token.len() == 6 && token.chars().all(|c| c.is_ascii_hexdigit()) {
        if let Some(name) = hex_to_name(&token) {
            return Some(name.to_string());
        }
    }

    // Unknown hex values and theme tokens stand as their own identifier.
    Some(token)
}

/// Normalize one run's color signal. The named highlight wins; the shading
/// fill and theme fill are consulted only when it is absent.
pub fn normalize_run_color(
    highlight: Option<&str>,
    fill: Option<&str>,
    theme_fill: Option<&str>,
) -> Option<String> {
    if let Some(value) = highlight {
        return normalize_token(value);
    }
    if let Some(color) = fill.and_then(normalize_token) {
        return Some(color);
    }
    theme_fill.and_then(normalize_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn named_and_hex_agree() {
        assert_eq!(normalize_token("yellow"), Some("yellow".to_string()));
        assert_eq!(normalize_token("FFFF00"), Some("yellow".to_string()));
        assert_eq!(normalize_token("#FFFF00"), Some("yellow".to_string()));
        assert_eq!(normalize_token("darkBlue"), Some("darkblue".to_string()));
        assert_eq!(normalize_token("000080"), Some("darkblue".to_string()));
    }

    #[test]
    fn alpha_channel_is_truncated() {
        assert_eq!(normalize_token("FFFF00FF"), Some("yellow".to_string()));
    }

    #[test]
    fn dotted_enumeration_prefix_is_stripped() {
        assert_eq!(
            normalize_token("COLOR_INDEX.YELLOW"),
            Some("yellow".to_string())
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["yellow", "FFFF00", "accent1", "ABCDEF"] {
            let once = normalize_token(raw).unwrap();
            assert_eq!(normalize_token(&once), Some(once.clone()));
        }
    }

    #[test]
    fn absent_and_auto_mean_uncolored() {
        assert_eq!(normalize_token(""), None);
        assert_eq!(normalize_token("  "), None);
        assert_eq!(normalize_token("auto"), None);
        assert_eq!(normalize_run_color(None, None, None), None);
        assert_eq!(normalize_run_color(None, Some("auto"), None), None);
    }

    #[test]
    fn unknown_hex_and_theme_tokens_pass_through_lowercased() {
        assert_eq!(normalize_token("ABC123"), Some("abc123".to_string()));
        assert_eq!(normalize_token("Accent1"), Some("accent1".to_string()));
    }

    #[test]
    fn named_highlight_wins_over_fill() {
        assert_eq!(
            normalize_run_color(Some("green"), Some("FFFF00"), None),
            Some("green".to_string())
        );
        assert_eq!(
            normalize_run_color(None, Some("FFFF00"), Some("accent1")),
            Some("yellow".to_string())
        );
        assert_eq!(
            normalize_run_color(None, Some("auto"), Some("Accent1")),
            Some("accent1".to_string())
        );
    }
}
