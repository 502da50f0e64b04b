use async_trait::async_trait;

use super::error::StorageError;

/// Remote object storage addressed by `(folder, name)`.
///
/// Implementations return the public URL of an object on upload; that URL is what
/// gets persisted next to the object name.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `folder/name` and return the object's public URL.
    async fn put(
        &self,
        folder: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, folder: &str, name: &str) -> Result<bool, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, folder: &str, name: &str) -> Result<bool, StorageError>;
}

/// Build the `folder/name` key shared by every backend.
///
/// Both segments are restricted to ASCII alphanumerics, `-`, `_` and `.` and may not
/// start with a dot, so a key can never escape its folder.
pub fn object_key(folder: &str, name: &str) -> Result<String, StorageError> {
    validate_segment(folder)?;
    validate_segment(name)?;
    Ok(format!("{folder}/{name}"))
}

fn validate_segment(segment: &str) -> Result<(), StorageError> {
    if segment.is_empty() || segment.starts_with('.') {
        return Err(StorageError::InvalidKey(format!(
            "'{segment}' is empty or hidden"
        )));
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(StorageError::InvalidKey(format!(
            "'{segment}' contains unsupported characters"
        )));
    }
    Ok(())
}
