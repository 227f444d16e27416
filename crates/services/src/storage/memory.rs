use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::{ObjectStorage, StorageError, validate_key};
use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process object storage for tests and local development.
pub struct MemoryStorage {
    bucket: String,
    objects: DashMap<String, StoredObject>,
    failing: RwLock<Vec<String>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self::with_clock(bucket, Arc::new(SystemClock))
    }

    /// Signed URL expiries are computed from `clock`.
    pub fn with_clock(bucket: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: DashMap::new(),
            failing: RwLock::new(Vec::new()),
            clock,
        }
    }

    /// Uploads to any key containing `pattern` fail from now on.
    pub fn fail_uploads_matching(&self, pattern: impl Into<String>) {
        self.failing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(pattern.into());
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|o| o.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|o| o.key().clone()).collect();
        keys.sort();
        keys
    }

    fn should_fail(&self, key: &str) -> bool {
        self.failing
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|pattern| key.contains(pattern.as_str()))
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        if self.should_fail(key) {
            return Err(StorageError::Rejected(format!("upload of {key} refused")));
        }
        self.objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://storage.local/{}/{}", self.bucket, key)
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_key(key)?;
        let expires = self.clock.now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("memory://{}/{}?expires={}", self.bucket, key, expires))
    }
}
