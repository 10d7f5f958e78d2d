//! HTTP API surface

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::rag::RagSystem;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<RagSystem>,
}

impl AppState {
    pub fn new(rag: Arc<RagSystem>) -> Self {
        Self { rag }
    }
}
