//! Media storage
//!
//! Uploaded post media and profile pictures are written under the
//! configured upload directory and served back by the router at `/uploads`.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

use super::ServiceError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key` and return its public URL
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String, ServiceError>;

    /// Remove the blob under `key`; a missing blob is not an error
    async fn delete(&self, key: &str) -> Result<(), ServiceError>;
}

/// Stores blobs on the local filesystem
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, ServiceError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ServiceError::invalid("Storage", format!("invalid key '{}'", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String, ServiceError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        tracing::debug!("Stored {} bytes ({}) at {}", data.len(), content_type, path.display());
        Ok(format!("{}/uploads/{}", self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:5000/");

        let url = store
            .put("posts/u1/1700000000000.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:5000/uploads/posts/u1/1700000000000.jpg");
        let written = std::fs::read(dir.path().join("posts/u1/1700000000000.jpg")).unwrap();
        assert_eq!(written, b"jpeg");
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:5000");
        store
            .put("posts/u1/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        store.delete("posts/u1/a.png").await.unwrap();
        assert!(!dir.path().join("posts/u1/a.png").exists());
        store.delete("posts/u1/a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:5000");
        let result = store.put("../escape.txt", Bytes::new(), "text/plain").await;
        assert!(matches!(result, Err(ServiceError::Invalid { .. })));
    }
}
