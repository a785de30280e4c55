//! annotext API server: REST backend for DOCX annotation extraction.
//!
//! Provides endpoints for:
//! - Parsing uploaded documents into highlight/comment/paragraph records
//! - Persisting parsed documents keyed by filename
//! - Comment-to-highlight link derivation
//! - A small settings blob for downstream UI clients

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod models;
mod state;
mod store;

use state::AppState;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("annotext_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing annotext API...");
    let state = Arc::new(AppState::new().await?);

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health))
        // Stateless parsing
        .route("/api/parse", post(handlers::parse_document))
        .route("/api/parse-multi", post(handlers::parse_multi))
        // Persisted documents
        .route("/api/upload-multi", post(handlers::upload_multi))
        .route("/api/docs", get(handlers::list_documents))
        .route("/api/docs/:filename", delete(handlers::delete_document))
        // Derived correlations
        .route("/api/links", get(handlers::list_links))
        // Settings blob
        .route(
            "/api/state",
            get(handlers::read_state).post(handlers::write_state),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting annotext API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
