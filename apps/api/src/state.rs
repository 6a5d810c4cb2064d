use std::sync::Arc;

use crate::analysis::repository::AnalysisRepository;
use crate::config::Config;
use crate::embeddings::EmbeddingService;
use crate::llm_client::LanguageModel;
use crate::render::PageConfig;
use crate::storage::ObjectStorage;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every external collaborator is held behind a trait object so the pipelines
/// can run against in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repository: Arc<dyn AnalysisRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub llm: Arc<dyn LanguageModel>,
    pub embedder: Arc<dyn EmbeddingService>,
    /// Page geometry for PDF output: A4, Helvetica 11pt, 1" margins.
    pub page_config: PageConfig,
}
