use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::retry::RetryPolicy;

/// Where uploaded and generated documents are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,

    pub storage_backend: StorageBackend,
    pub local_storage_root: String,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub resume_bucket: String,
    pub job_bucket: String,
    pub optimized_bucket: String,

    pub cohere_api_key: String,
    pub cohere_base_url: String,
    pub chat_model: String,
    pub embed_model: String,

    pub retry_max_attempts: u32,
    pub retry_delay_ms: u64,
    pub pipeline_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_backend = match optional_env("STORAGE_BACKEND", "s3").as_str() {
            "s3" => StorageBackend::S3,
            "local" => StorageBackend::Local,
            other => bail!("STORAGE_BACKEND must be 's3' or 'local', got '{other}'"),
        };

        let (aws_access_key_id, aws_secret_access_key) = if storage_backend == StorageBackend::S3
        {
            (
                Some(require_env("AWS_ACCESS_KEY_ID")?),
                Some(require_env("AWS_SECRET_ACCESS_KEY")?),
            )
        } else {
            (None, None)
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG", "info"),

            storage_backend,
            local_storage_root: optional_env("LOCAL_STORAGE_ROOT", "./data"),
            s3_endpoint: std::env::var("S3_ENDPOINT").ok(),
            s3_region: optional_env("S3_REGION", "us-east-1"),
            aws_access_key_id,
            aws_secret_access_key,
            resume_bucket: optional_env("RESUME_BUCKET", "resumes"),
            job_bucket: optional_env("JOB_BUCKET", "jobs"),
            optimized_bucket: optional_env("OPTIMIZED_BUCKET", "optimized-resumes"),

            cohere_api_key: require_env("COHERE_API_KEY")?,
            cohere_base_url: optional_env("COHERE_BASE_URL", "https://api.cohere.com"),
            chat_model: optional_env("CHAT_MODEL", "command-r-plus-08-2024"),
            embed_model: optional_env("EMBED_MODEL", "embed-english-v3.0"),

            retry_max_attempts: parse_env("RETRY_MAX_ATTEMPTS", 3)?,
            retry_delay_ms: parse_env("RETRY_DELAY_MS", 1000)?,
            pipeline_timeout_secs: parse_env("PIPELINE_TIMEOUT_SECS", 300)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        })
    }

    /// The retry policy handed to every outbound network client.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
