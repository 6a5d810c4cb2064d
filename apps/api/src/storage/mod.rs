//! Object storage for uploaded résumés, job descriptions and rendered output.
//!
//! Backends: S3-compatible (`s3`) or a directory tree on local disk (`local`).

pub mod local;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::errors::PipelineError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object {bucket}/{path} not found")]
    NotFound { bucket: String, path: String },

    #[error("invalid object path '{0}'")]
    InvalidPath(String),

    #[error("{0}")]
    Backend(String),
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        PipelineError::Storage(err.to_string())
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` and returns the path it was stored under.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError>;

    async fn remove(&self, bucket: &str, path: &str) -> Result<(), StorageError>;
}
