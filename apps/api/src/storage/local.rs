use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use super::{ObjectStorage, StorageError};

/// Stores objects as files under `<root>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, StorageError> {
        for part in [bucket, path] {
            let relative = Path::new(part);
            let safe = !part.is_empty()
                && relative
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !safe {
                return Err(StorageError::InvalidPath(part.to_string()));
            }
        }
        Ok(self.root.join(bucket).join(path))
    }
}

fn io_error(bucket: &str, path: &str, err: std::io::Error) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound {
            bucket: bucket.to_string(),
            path: path.to_string(),
        }
    } else {
        StorageError::Backend(format!("{bucket}/{path}: {err}"))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(bucket, path, e))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| io_error(bucket, path, e))?;

        info!("Stored {} bytes at {}", bytes.len(), target.display());
        Ok(path.to_string())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        let target = self.resolve(bucket, path)?;
        let data = tokio::fs::read(&target)
            .await
            .map_err(|e| io_error(bucket, path, e))?;
        Ok(Bytes::from(data))
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(bucket, path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(bucket, path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let path = storage
            .upload("resumes", "u1/a1/cv.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        assert_eq!(path, "u1/a1/cv.txt");

        let bytes = storage.download("resumes", "u1/a1/cv.txt").await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.download("resumes", "nope.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_parent_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage
            .upload("resumes", "../escape.txt", Bytes::new(), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));

        let err = storage.download("/etc", "passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage
            .upload("jobs", "j.txt", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();
        storage.remove("jobs", "j.txt").await.unwrap();
        storage.remove("jobs", "j.txt").await.unwrap();
        assert!(storage.download("jobs", "j.txt").await.is_err());
    }
}
