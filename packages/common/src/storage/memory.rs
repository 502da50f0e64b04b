use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::error::StorageError;
use super::traits::{ObjectStore, object_key};

/// Object store that keeps everything in memory.
///
/// Used by tests and by the `memory` storage backend. Failures can be injected
/// to exercise the compensation paths of callers.
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    public_url: String,
    /// Number of puts that succeed before every further put fails. `usize::MAX` disables it.
    puts_before_failure: AtomicUsize,
    fail_deletes: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            puts_before_failure: AtomicUsize::new(usize::MAX),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Let the next `n` puts succeed and fail every put after that.
    pub fn fail_puts_after(&self, n: usize) {
        self.puts_before_failure.store(n, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Clear injected failures.
    pub fn heal(&self) {
        self.puts_before_failure.store(usize::MAX, Ordering::SeqCst);
        self.fail_deletes.store(false, Ordering::SeqCst);
    }

    /// Sorted keys of every stored object.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map still holds consistent data; every critical section is a single call.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_put_permit(&self) -> bool {
        self.puts_before_failure
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        folder: &str,
        name: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(folder, name)?;
        if !self.take_put_permit() {
            return Err(StorageError::Backend(format!("injected put failure for {key}")));
        }
        self.lock().insert(key.clone(), data);
        Ok(format!("{}/{key}", self.public_url))
    }

    async fn delete(&self, folder: &str, name: &str) -> Result<bool, StorageError> {
        let key = object_key(folder, name)?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!(
                "injected delete failure for {key}"
            )));
        }
        Ok(self.lock().remove(&key).is_some())
    }

    async fn exists(&self, folder: &str, name: &str) -> Result<bool, StorageError> {
        let key = object_key(folder, name)?;
        Ok(self.lock().contains_key(&key))
    }
}
