//! Filesystem backend.
//!
//! Objects live under `root/{key}` and are served from `base_url/{key}` by
//! whatever static file server fronts the directory. Writes go to a sibling
//! temp file first and are renamed into place, so a reader never sees a
//! half-written object.

use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Open (creating if needed) the storage directory at `root`.
    pub async fn new(root: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Misconfigured(format!("Cannot create {}: {}", root.display(), e))
        })?;

        Ok(Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        let path = self.root.join(key);
        // The joined path must stay under the root.
        if !path.starts_with(&self.root) {
            return Err(StorageError::InvalidKey(format!(
                "{} resolves outside the storage root",
                key
            )));
        }
        Ok(path)
    }

    async fn is_file(path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let staging = path.with_extension(format!("{}.part", uuid::Uuid::new_v4().simple()));
        let mut file = fs::File::create(&staging).await?;
        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&staging).await;
            return Err(e);
        }
        fs::rename(&staging, path).await
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, storage_key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let path = self.resolve(storage_key)?;
        let start = std::time::Instant::now();

        Self::write_atomically(&path, &data).await.map_err(|e| {
            tracing::error!(error = %e, key = %storage_key, "Local write failed");
            StorageError::WriteFailed(format!("{}: {}", path.display(), e))
        })?;

        tracing::info!(
            key = %storage_key,
            content_type = %content_type,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored file on local disk"
        );
        Ok(())
    }

    async fn durable_url(&self, storage_key: &str) -> StorageResult<String> {
        self.resolve(storage_key)?;
        Ok(format!("{}/{}", self.base_url, storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(storage_key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::ReadFailed(format!("{}: {}", path.display(), e))),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.resolve(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %storage_key, "Deleted file from local disk");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!("{}: {}", path.display(), e))),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.resolve(storage_key)?;
        Ok(Self::is_file(&path).await)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("media"), "http://localhost:8080/media/".into())
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn stored_bytes_round_trip_through_disk() {
        let (_dir, storage) = open().await;
        let key = "buildings/b1/image_1700000000000.jpg";

        storage
            .put(key, Bytes::from_static(b"jpeg bytes"), "image/jpeg")
            .await
            .unwrap();

        assert!(storage.root().join(key).is_file());
        assert_eq!(storage.download(key).await.unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn put_leaves_no_staging_files() {
        let (_dir, storage) = open().await;
        storage
            .put("units/u1/image_1.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        let names: Vec<_> = std::fs::read_dir(storage.root().join("units/u1"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["image_1.png".to_string()]);
    }

    #[tokio::test]
    async fn url_is_base_url_plus_key() {
        let (_dir, storage) = open().await;
        assert_eq!(
            storage.durable_url("providers/p1/logo_1.png").await.unwrap(),
            "http://localhost:8080/media/providers/p1/logo_1.png"
        );
    }

    #[tokio::test]
    async fn keys_escaping_the_root_are_refused() {
        let (_dir, storage) = open().await;
        for key in ["../../../etc/passwd", "/etc/passwd", "units/../../x"] {
            assert!(matches!(
                storage.download(key).await,
                Err(StorageError::InvalidKey(_))
            ));
            assert!(matches!(
                storage.put(key, Bytes::new(), "image/png").await,
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, storage) = open().await;
        let key = "units/u7/image_5.png";
        storage.put(key, Bytes::from_static(b"png"), "image/png").await.unwrap();

        assert!(storage.exists(key).await.unwrap());
        storage.delete(key).await.unwrap();
        storage.delete(key).await.unwrap();
        assert!(!storage.exists(key).await.unwrap());
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let (_dir, storage) = open().await;
        assert!(matches!(
            storage.download("requests/r1/photo_1.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
