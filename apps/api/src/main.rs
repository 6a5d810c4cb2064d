mod analysis;
mod config;
mod db;
mod embeddings;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod optimization;
mod render;
mod retry;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::repository::PgAnalysisRepository;
use crate::config::{Config, StorageBackend};
use crate::db::create_pool;
use crate::embeddings::EmbeddingClient;
use crate::llm_client::LlmClient;
use crate::render::default_page_config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{local::LocalStorage, s3::S3Storage, ObjectStorage};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration errors abort startup before anything is bound
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume optimizer API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (migrations run on connect)
    let db = create_pool(&config.database_url).await?;
    let repository = Arc::new(PgAnalysisRepository::new(db));

    let storage: Arc<dyn ObjectStorage> = match config.storage_backend {
        StorageBackend::S3 => {
            let client = build_s3_client(&config).await;
            info!("S3 storage initialized (region: {})", config.s3_region);
            Arc::new(S3Storage::new(client))
        }
        StorageBackend::Local => {
            info!("Local storage initialized at {}", config.local_storage_root);
            Arc::new(LocalStorage::new(&config.local_storage_root))
        }
    };

    let llm = LlmClient::new(
        config.cohere_api_key.clone(),
        config.cohere_base_url.clone(),
        config.chat_model.clone(),
        config.retry_policy(),
    )?;
    info!(
        "LLM client initialized (model: {}, attempts: {})",
        llm.model(),
        config.retry_policy().max_attempts()
    );

    let embedder = EmbeddingClient::new(
        config.cohere_api_key.clone(),
        config.cohere_base_url.clone(),
        config.embed_model.clone(),
        config.retry_policy(),
    )?;
    info!("Embedding client initialized (model: {})", config.embed_model);

    let page_config = default_page_config();
    info!(
        "Page config: {}x{}pt, {}pt text",
        page_config.page_width_pt, page_config.page_height_pt, page_config.font_size_pt
    );

    let state = AppState {
        config: config.clone(),
        repository,
        storage,
        llm: Arc::new(llm),
        embedder: Arc::new(embedder),
        page_config,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for AWS, or for MinIO when `S3_ENDPOINT` is set.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()));

    if let (Some(key), Some(secret)) = (
        config.aws_access_key_id.as_deref(),
        config.aws_secret_access_key.as_deref(),
    ) {
        loader = loader.credentials_provider(Credentials::new(
            key,
            secret,
            None,
            None,
            "resume-optimizer-static",
        ));
    }

    let shared = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared);
    if let Some(endpoint) = &config.s3_endpoint {
        // MinIO only serves path-style requests
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    aws_sdk_s3::Client::from_conf(builder.build())
}
