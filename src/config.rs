//! Runtime configuration
//!
//! Deployment knobs come from the environment; engine constants
//! (round budget, temperature, token cap) are compile-time defaults in the
//! engine itself.

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Anthropic API key (required for real use)
    pub anthropic_api_key: Option<String>,
    /// Model identifier for the Messages API
    pub model: String,
    /// HTTP listen port
    pub port: u16,
    /// SQLite catalog path
    pub db_path: String,
    /// Folder of course documents ingested at startup
    pub docs_path: String,
    /// Content chunk size in characters
    pub chunk_size: usize,
    /// Chunk overlap in characters
    pub chunk_overlap: usize,
    /// Retrieval hit cap per search
    pub max_results: usize,
    /// Retained exchanges per session
    pub max_history: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = std::env::var("LECTERN_DB_PATH").unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            format!("{home}/.lectern/catalog.db")
        });

        Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            model: std::env::var("LECTERN_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            port: std::env::var("LECTERN_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            db_path,
            docs_path: std::env::var("LECTERN_DOCS_PATH").unwrap_or_else(|_| "./docs".to_string()),
            chunk_size: 800,
            chunk_overlap: 100,
            max_results: 5,
            max_history: 2,
        }
    }
}
