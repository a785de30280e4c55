//! Key-by-filename persistence for parsed documents, plus the settings blob.
//!
//! Documents are stored as one JSON row per filename; listing returns the
//! aggregated union across every stored document. Settings live in a small
//! key/value table restricted to a fixed allow-list of option names.

use anyhow::Result;
use serde_json::{json, Map, Value};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use annotext_types::ParsedDocument;

/// Option names accepted by the settings blob; anything else is discarded.
pub const ALLOWED_STATE_KEYS: &[&str] = &[
    "colorMap",
    "codeMap",
    "categoryColors",
    "catOverride",
    "meta",
    "extraCategories",
];

fn default_state() -> Map<String, Value> {
    let defaults = json!({
        "colorMap": {},
        "codeMap": {},
        "categoryColors": {},
        "catOverride": {},
        "meta": {},
        "extraCategories": ["XX_X"],
    });
    match defaults {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Upsert one parsed document under its filename.
pub async fn save_doc(pool: &SqlitePool, filename: &str, parsed: &ParsedDocument) -> Result<()> {
    let data = serde_json::to_string(parsed)?;
    sqlx::query("REPLACE INTO docs(filename, data) VALUES (?, ?)")
        .bind(filename)
        .bind(data)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_doc(pool: &SqlitePool, filename: &str) -> Result<()> {
    sqlx::query("DELETE FROM docs WHERE filename = ?")
        .bind(filename)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_filenames(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT filename FROM docs ORDER BY filename")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|r| r.get::<String, _>(0)).collect())
}

/// Aggregate union across all stored documents. Rows that no longer
/// deserialize are skipped rather than failing the listing.
pub async fn list_docs(pool: &SqlitePool) -> Result<ParsedDocument> {
    let rows = sqlx::query("SELECT data FROM docs ORDER BY filename")
        .fetch_all(pool)
        .await?;

    let mut aggregate = ParsedDocument::default();
    for row in rows {
        let data: String = row.get(0);
        match serde_json::from_str::<ParsedDocument>(&data) {
            Ok(parsed) => aggregate.extend(parsed),
            Err(e) => tracing::warn!("skipping unreadable stored document: {e}"),
        }
    }
    Ok(aggregate)
}

/// Stored settings merged over defaults; unknown stored keys are ignored.
pub async fn get_state(pool: &SqlitePool) -> Result<Map<String, Value>> {
    let rows = sqlx::query("SELECT key, value FROM kv").fetch_all(pool).await?;

    let mut state = default_state();
    for row in rows {
        let key: String = row.get(0);
        if !ALLOWED_STATE_KEYS.contains(&key.as_str()) {
            continue;
        }
        let raw: String = row.get(1);
        let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
        state.insert(key, value);
    }
    Ok(state)
}

/// Persist the allow-listed subset of a settings patch, returning the merged
/// result.
pub async fn set_state(
    pool: &SqlitePool,
    patch: Map<String, Value>,
) -> Result<Map<String, Value>> {
    for (key, value) in patch {
        if !ALLOWED_STATE_KEYS.contains(&key.as_str()) {
            continue;
        }
        sqlx::query("REPLACE INTO kv(key, value) VALUES (?, ?)")
            .bind(&key)
            .bind(serde_json::to_string(&value)?)
            .execute(pool)
            .await?;
    }
    get_state(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use annotext_types::ParagraphRecord;
    use pretty_assertions::assert_eq;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_state() -> AppState {
        // A single connection keeps every query on the same in-memory db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        AppState::from_pool(pool).await.unwrap()
    }

    fn doc(filename: &str, text: &str) -> ParsedDocument {
        ParsedDocument {
            highlights: Vec::new(),
            comments: Vec::new(),
            paragraphs: vec![ParagraphRecord {
                filename: filename.to_string(),
                para_index: Some(0),
                text: text.to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn save_list_delete_round_trip() {
        let state = memory_state().await;

        save_doc(&state.db, "a.docx", &doc("a.docx", "first")).await.unwrap();
        save_doc(&state.db, "b.docx", &doc("b.docx", "second")).await.unwrap();

        let aggregate = list_docs(&state.db).await.unwrap();
        assert_eq!(aggregate.paragraphs.len(), 2);
        assert_eq!(
            list_filenames(&state.db).await.unwrap(),
            vec!["a.docx", "b.docx"]
        );

        delete_doc(&state.db, "a.docx").await.unwrap();
        let aggregate = list_docs(&state.db).await.unwrap();
        assert_eq!(aggregate.paragraphs.len(), 1);
        assert_eq!(aggregate.paragraphs[0].filename, "b.docx");
    }

    #[tokio::test]
    async fn saving_twice_replaces_the_document() {
        let state = memory_state().await;

        save_doc(&state.db, "a.docx", &doc("a.docx", "old")).await.unwrap();
        save_doc(&state.db, "a.docx", &doc("a.docx", "new")).await.unwrap();

        let aggregate = list_docs(&state.db).await.unwrap();
        assert_eq!(aggregate.paragraphs.len(), 1);
        assert_eq!(aggregate.paragraphs[0].text, "new");
    }

    #[tokio::test]
    async fn state_merges_patch_over_defaults() {
        let state = memory_state().await;

        let initial = get_state(&state.db).await.unwrap();
        assert_eq!(initial["extraCategories"], serde_json::json!(["XX_X"]));

        let mut patch = Map::new();
        patch.insert("colorMap".to_string(), json!({"CE_P": "yellow"}));
        patch.insert("ignored".to_string(), json!(true));

        let merged = set_state(&state.db, patch).await.unwrap();
        assert_eq!(merged["colorMap"], json!({"CE_P": "yellow"}));
        assert!(merged.get("ignored").is_none());
        // Untouched keys keep their defaults.
        assert_eq!(merged["meta"], json!({}));
    }
}
