//! lectern - course materials RAG backend
//!
//! An HTTP service that answers questions about indexed course transcripts
//! by driving a bounded tool-use conversation with an LLM backend.

mod api;
mod config;
mod engine;
mod ingest;
mod llm;
mod rag;
mod session;
mod store;
mod system_prompt;
mod tools;

use api::{create_router, AppState};
use config::Config;
use engine::AnswerEngine;
use llm::{AnthropicClient, LlmClient, LoggingClient};
use rag::RagSystem;
use session::SessionManager;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::SqliteCatalog;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    // Ensure catalog directory exists
    if let Some(parent) = PathBuf::from(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path, "Opening course catalog");
    let store = Arc::new(SqliteCatalog::open(&config.db_path, config.max_results)?);

    let api_key = config.anthropic_api_key.clone().unwrap_or_else(|| {
        tracing::warn!("ANTHROPIC_API_KEY not set; backend calls will fail");
        String::new()
    });
    let anthropic: Arc<dyn LlmClient> =
        Arc::new(AnthropicClient::new(api_key, config.model.clone()));
    let llm: Arc<dyn LlmClient> = Arc::new(LoggingClient::new(anthropic));
    tracing::info!(model = %config.model, "LLM client initialized");

    let rag = Arc::new(RagSystem::new(
        store,
        AnswerEngine::new(llm),
        SessionManager::new(config.max_history),
        config.chunk_size,
        config.chunk_overlap,
    ));

    // Index course documents present at startup
    let docs = Path::new(&config.docs_path);
    if docs.is_dir() {
        let (courses, chunks) = rag.add_course_folder(docs);
        tracing::info!(courses, chunks, "Startup ingestion complete");
    } else {
        tracing::info!(path = %config.docs_path, "No docs folder, skipping ingestion");
    }

    let state = AppState::new(rag);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("lectern listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
