//! HTTP handlers for the annotext API.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde_json::{Map, Value};
use std::sync::Arc;

use annotext_engine::{correlate, Extractor};
use annotext_types::{LinkRecord, ParsedDocument};

use crate::error::ApiError;
use crate::models::{DeleteResponse, ParseQuery, SettingsPatch};
use crate::state::AppState;
use crate::store;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// One uploaded file's name and bytes.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

async fn collect_uploads(mut multipart: Multipart) -> Result<Vec<Upload>, ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("invalid multipart body: {e}")))?
    {
        let filename = field
            .file_name()
            .unwrap_or("upload.docx")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("failed to read upload: {e}")))?;
        uploads.push(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    if uploads.is_empty() {
        return Err(ApiError::InvalidRequest(
            "no file field in multipart body".to_string(),
        ));
    }
    Ok(uploads)
}

/// Parse a single uploaded document and return its records.
pub async fn parse_document(
    Query(query): Query<ParseQuery>,
    multipart: Multipart,
) -> Result<Json<ParsedDocument>, ApiError> {
    let extractor = Extractor::new(query.code_scheme()?);
    let upload = collect_uploads(multipart).await?.remove(0);
    let parsed = extractor.parse(&upload.bytes, &upload.filename)?;
    Ok(Json(parsed))
}

/// Parse several uploads and return the aggregated union. A file that fails
/// to parse is reported and skipped; it never aborts its siblings.
pub async fn parse_multi(
    Query(query): Query<ParseQuery>,
    multipart: Multipart,
) -> Result<Json<ParsedDocument>, ApiError> {
    let extractor = Extractor::new(query.code_scheme()?);
    let mut aggregate = ParsedDocument::default();
    for upload in collect_uploads(multipart).await? {
        match extractor.parse(&upload.bytes, &upload.filename) {
            Ok(parsed) => aggregate.extend(parsed),
            Err(e) => tracing::warn!("{}: extraction failed: {e}", upload.filename),
        }
    }
    Ok(Json(aggregate))
}

/// Parse and persist several uploads, returning the stored aggregate
/// including previously uploaded documents.
pub async fn upload_multi(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ParseQuery>,
    multipart: Multipart,
) -> Result<Json<ParsedDocument>, ApiError> {
    let extractor = Extractor::new(query.code_scheme()?);
    for upload in collect_uploads(multipart).await? {
        match extractor.parse(&upload.bytes, &upload.filename) {
            Ok(parsed) => {
                store::save_doc(&state.db, &upload.filename, &parsed).await?;
                tracing::info!("stored document: {}", upload.filename);
            }
            Err(e) => tracing::warn!("{}: extraction failed: {e}", upload.filename),
        }
    }
    Ok(Json(store::list_docs(&state.db).await?))
}

/// Aggregated records across all stored documents.
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ParsedDocument>, ApiError> {
    Ok(Json(store::list_docs(&state.db).await?))
}

/// Remove one stored document by filename.
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    store::delete_doc(&state.db, &filename).await?;
    tracing::info!("deleted document: {filename}");
    Ok(Json(DeleteResponse {
        filenames: store::list_filenames(&state.db).await?,
        docs: store::list_docs(&state.db).await?,
    }))
}

/// Comment-to-highlight link records derived from the stored aggregate.
pub async fn list_links(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LinkRecord>>, ApiError> {
    let aggregate = store::list_docs(&state.db).await?;
    Ok(Json(correlate::link_comments(
        &aggregate.highlights,
        &aggregate.comments,
    )))
}

pub async fn read_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    Ok(Json(store::get_state(&state.db).await?))
}

pub async fn write_state(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    Ok(Json(store::set_state(&state.db, patch.into_map()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::io::{Cursor, Write};
    use tower::ServiceExt;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    const BOUNDARY: &str = "annotext-test-boundary";

    fn docx_with_highlight(text: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        let document = format!(
            r#"<w:document xmlns:w="{WML_NS}"><w:body><w:p><w:r><w:rPr><w:highlight w:val="yellow"/></w:rPr><w:t>{text}</w:t></w:r></w:p></w:body></w:document>"#
        );
        zip.write_all(document.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (filename, bytes) in files {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn memory_state() -> Arc<AppState> {
        // A single connection keeps every query on the same in-memory db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Arc::new(AppState::from_pool(pool).await.unwrap())
    }

    fn test_router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/api/parse-multi", post(parse_multi))
            .route("/api/upload-multi", post(upload_multi))
            .with_state(state)
    }

    async fn post_multipart(
        router: Router,
        uri: &str,
        body: Vec<u8>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn parse_multi_skips_a_file_that_fails_extraction() {
        let state = memory_state().await;
        let good = docx_with_highlight("kept text");
        let body = multipart_body(&[
            ("good.docx", good.as_slice()),
            ("bad.docx", &b"not a zip archive"[..]),
        ]);

        let (status, json) = post_multipart(test_router(state), "/api/parse-multi", body).await;

        assert_eq!(status, StatusCode::OK);
        let paragraphs = json["paragraphs"].as_array().unwrap();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0]["filename"], "good.docx");
        assert_eq!(json["highlights"].as_array().unwrap().len(), 1);
        assert_eq!(json["highlights"][0]["text"], "kept text");
    }

    #[tokio::test]
    async fn upload_multi_stores_only_the_files_that_parse() {
        let state = memory_state().await;
        let good = docx_with_highlight("stored text");
        let body = multipart_body(&[
            ("good.docx", good.as_slice()),
            ("bad.docx", &b"garbage"[..]),
        ]);

        let (status, json) =
            post_multipart(test_router(state.clone()), "/api/upload-multi", body).await;

        assert_eq!(status, StatusCode::OK);
        let paragraphs = json["paragraphs"].as_array().unwrap();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0]["filename"], "good.docx");

        // The failed sibling must not leave a stored row behind.
        assert_eq!(
            store::list_filenames(&state.db).await.unwrap(),
            vec!["good.docx"]
        );
    }
}
