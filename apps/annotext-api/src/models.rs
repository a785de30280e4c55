//! Request/response models for the annotext API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use annotext_engine::CodeScheme;
use annotext_types::ParsedDocument;

use crate::error::ApiError;

/// Query options shared by the parse endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ParseQuery {
    /// Code-extraction strategy: "scan" (default) or "pairs".
    pub scheme: Option<String>,
}

impl ParseQuery {
    pub fn code_scheme(&self) -> Result<CodeScheme, ApiError> {
        match self.scheme.as_deref() {
            None => Ok(CodeScheme::default()),
            Some(name) => CodeScheme::from_name(name).ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "unknown scheme {name:?}, expected \"scan\" or \"pairs\""
                ))
            }),
        }
    }
}

/// Partial settings update; only the allow-listed option names exist as
/// fields, so unknown keys never reach the store.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub color_map: Option<Value>,
    pub code_map: Option<Value>,
    pub category_colors: Option<Value>,
    pub cat_override: Option<Value>,
    pub meta: Option<Value>,
    pub extra_categories: Option<Value>,
}

impl SettingsPatch {
    /// Present fields as a JSON map keyed by their wire names.
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        let fields = [
            ("colorMap", self.color_map),
            ("codeMap", self.code_map),
            ("categoryColors", self.category_colors),
            ("catOverride", self.cat_override),
            ("meta", self.meta),
            ("extraCategories", self.extra_categories),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        }
        map
    }
}

/// Response for document deletion: remaining filenames plus the remaining
/// aggregate record collections.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub filenames: Vec<String>,
    #[serde(flatten)]
    pub docs: ParsedDocument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scheme_query_defaults_to_scan() {
        let query = ParseQuery::default();
        assert_eq!(query.code_scheme().unwrap(), CodeScheme::PrefixScan);
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let query = ParseQuery {
            scheme: Some("magic".to_string()),
        };
        assert!(query.code_scheme().is_err());
    }

    #[test]
    fn settings_patch_keeps_only_present_fields() {
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"colorMap": {"CE_P": "yellow"}, "meta": {"v": 1}}"#).unwrap();
        let map = patch.into_map();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("colorMap"));
        assert!(map.contains_key("meta"));
    }
}
