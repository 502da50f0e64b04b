use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{ObjectStore, object_key};

/// Filesystem-backed object store.
///
/// Objects live at `{base_path}/{folder}/{name}` and are published under
/// `{public_url}/{folder}/{name}`; the server mounts `base_path` at that URL.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_url: String,
    max_size: u64,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(
        base_path: PathBuf,
        public_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(
        &self,
        folder: &str,
        name: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(folder, name)?;
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let target = self.base_path.join(&key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write-then-rename so readers never observe a partial object.
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(format!("{}/{key}", self.public_url))
    }

    async fn delete(&self, folder: &str, name: &str) -> Result<bool, StorageError> {
        let key = object_key(folder, name)?;
        match fs::remove_file(self.base_path.join(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, folder: &str, name: &str) -> Result<bool, StorageError> {
        let key = object_key(folder, name)?;
        Ok(fs::try_exists(self.base_path.join(key)).await?)
    }
}
