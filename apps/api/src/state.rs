use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::profile::resume_store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// `None` when no AI key is configured; AI features degrade to their
    /// "not configured" fallbacks.
    pub llm: Option<Arc<dyn TextGenerator>>,
    pub config: Config,
    /// Uploaded resumes and their JSON sidecars.
    pub resumes: ResumeStore,
}

impl AppState {
    pub fn llm(&self) -> Option<&dyn TextGenerator> {
        self.llm.as_deref()
    }
}
