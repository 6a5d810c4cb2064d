//! In-memory fakes of the external collaborators, for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::analysis::repository::AnalysisRepository;
use crate::config::{Config, StorageBackend};
use crate::embeddings::{EmbeddingError, EmbeddingService};
use crate::llm_client::{CompletionRequest, LanguageModel, LlmError};
use crate::models::analysis::{Analysis, AnalysisStatus, NewAnalysis, Suggestion};
use crate::render::default_page_config;
use crate::state::AppState;
use crate::storage::{ObjectStorage, StorageError};

pub const THREE_SUGGESTIONS_JSON: &str = r#"[
    {"category": "Skills", "suggestion": "Add missing technical skills", "details": "List Kubernetes.", "impact": "High"},
    {"category": "Experience", "suggestion": "Add quantifiable achievements", "details": "Use numbers.", "impact": "High"},
    {"category": "Format", "suggestion": "Use consistent bullets", "details": "Pick one marker.", "impact": "Low"}
]"#;

// ────────────────────────────────────────────────────────────────────────────
// Language model
// ────────────────────────────────────────────────────────────────────────────

/// Replays queued responses in order; an exhausted script answers `""`.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(String::new()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Embeddings
// ────────────────────────────────────────────────────────────────────────────

/// Returns the same vectors for every request, or a 503 when failing.
pub struct StaticEmbedder {
    vectors: Option<Vec<Vec<f32>>>,
}

impl StaticEmbedder {
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        Self {
            vectors: Some(vectors),
        }
    }

    pub fn failing() -> Self {
        Self { vectors: None }
    }
}

#[async_trait]
impl EmbeddingService for StaticEmbedder {
    async fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.vectors.clone().ok_or_else(|| EmbeddingError::Api {
            status: 503,
            message: "embedding service unavailable".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Object storage
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<(String, String), Bytes>>,
    failing_bucket: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload into `bucket` fails.
    pub fn failing_uploads_to(bucket: &str) -> Self {
        Self {
            failing_bucket: Some(bucket.to_string()),
            ..Self::default()
        }
    }

    pub fn put(&self, bucket: &str, path: &str, bytes: Bytes) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), path.to_string()), bytes);
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    pub fn count(&self, bucket: &str) -> usize {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .count()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if self.failing_bucket.as_deref() == Some(bucket) {
            return Err(StorageError::Backend(format!("bucket {bucket} is read-only")));
        }
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), path.to_string()), bytes);
        Ok(path.to_string())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        self.get(bucket, path).ok_or_else(|| StorageError::NotFound {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Repository
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<HashMap<Uuid, Analysis>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row directly, bypassing the lifecycle.
    pub fn put(&self, analysis: Analysis) {
        self.rows.lock().unwrap().insert(analysis.id, analysis);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Analysis> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<Analysis> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    fn transition(
        &self,
        id: Uuid,
        from: &[AnalysisStatus],
        apply: impl FnOnce(&mut Analysis),
    ) -> bool {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(row) if from.contains(&row.status) => {
                apply(row);
                row.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl AnalysisRepository for MemoryRepository {
    async fn insert(&self, new: &NewAnalysis) -> Result<Analysis> {
        let now = Utc::now();
        let analysis = Analysis {
            id: new.id,
            user_id: new.user_id,
            resume_path: new.resume_path.clone(),
            job_description_path: new.job_description_path.clone(),
            file_format: new.file_format,
            original_filename: new.original_filename.clone(),
            status: AnalysisStatus::Pending,
            similarity_score: None,
            suggestions: Vec::new(),
            results: None,
            selected_suggestions: Vec::new(),
            optimized_at: None,
            optimized_file_name: None,
            created_at: now,
            updated_at: now,
        };
        self.put(analysis.clone());
        Ok(analysis)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>> {
        Ok(self.snapshot(id))
    }

    async fn mark_processing(&self, id: Uuid) -> Result<bool> {
        Ok(self.transition(id, &[AnalysisStatus::Pending], |row| {
            row.status = AnalysisStatus::Processing;
        }))
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        similarity_score: f64,
        suggestions: &[Suggestion],
        results: &Value,
    ) -> Result<bool> {
        Ok(self.transition(
            id,
            &[AnalysisStatus::Pending, AnalysisStatus::Processing],
            |row| {
                row.status = AnalysisStatus::Completed;
                row.similarity_score = Some(similarity_score);
                row.suggestions = suggestions.to_vec();
                row.results = Some(results.clone());
            },
        ))
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<bool> {
        Ok(self.transition(
            id,
            &[AnalysisStatus::Pending, AnalysisStatus::Processing],
            |row| {
                row.status = AnalysisStatus::Failed;
                row.results = Some(json!({ "error": message }));
            },
        ))
    }

    async fn record_optimization(
        &self,
        id: Uuid,
        selected: &[Uuid],
        file_name: &str,
        optimized_at: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(row) = self.rows.lock().unwrap().get_mut(&id) {
            row.selected_suggestions = selected.to_vec();
            row.optimized_file_name = Some(file_name.to_string());
            row.optimized_at = Some(optimized_at);
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        storage_backend: StorageBackend::Local,
        local_storage_root: "./data".to_string(),
        s3_endpoint: None,
        s3_region: "us-east-1".to_string(),
        aws_access_key_id: None,
        aws_secret_access_key: None,
        resume_bucket: "resumes".to_string(),
        job_bucket: "jobs".to_string(),
        optimized_bucket: "optimized-resumes".to_string(),
        cohere_api_key: "test-key".to_string(),
        cohere_base_url: "http://localhost".to_string(),
        chat_model: "test-chat".to_string(),
        embed_model: "test-embed".to_string(),
        retry_max_attempts: 1,
        retry_delay_ms: 0,
        pipeline_timeout_secs: 300,
        max_upload_bytes: 1024 * 1024,
    }
}

/// Concrete fakes plus the `AppState` that wraps them.
pub struct Harness {
    pub llm: Arc<ScriptedModel>,
    pub embedder: Arc<StaticEmbedder>,
    pub storage: Arc<MemoryStorage>,
    pub repository: Arc<MemoryRepository>,
    pub config: Config,
}

impl Harness {
    pub fn new(llm: ScriptedModel, embedder: StaticEmbedder) -> Self {
        Self {
            llm: Arc::new(llm),
            embedder: Arc::new(embedder),
            storage: Arc::new(MemoryStorage::new()),
            repository: Arc::new(MemoryRepository::new()),
            config: test_config(),
        }
    }

    /// A model that always answers with three valid suggestions and an
    /// embedder returning two non-orthogonal vectors.
    pub fn happy() -> Self {
        Self::new(
            ScriptedModel::new(vec![Ok(THREE_SUGGESTIONS_JSON.to_string())]),
            StaticEmbedder::new(vec![vec![1.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]]),
        )
    }

    pub fn with_storage(mut self, storage: MemoryStorage) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pipeline_timeout_secs = secs;
        self
    }

    pub fn state(&self) -> AppState {
        AppState {
            config: self.config.clone(),
            repository: self.repository.clone(),
            storage: self.storage.clone(),
            llm: self.llm.clone(),
            embedder: self.embedder.clone(),
            page_config: default_page_config(),
        }
    }
}
