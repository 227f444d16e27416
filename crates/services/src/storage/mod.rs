pub mod memory;
pub mod s3;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use memory::MemoryStorage;
pub use s3::S3Storage;

/// Longest lifetime a signed URL may have (SigV4 presign limit).
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Storage returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Upload rejected: {0}")]
    Rejected(String),
}

/// Object storage for generated images.
///
/// Key naming belongs to the caller; implementations only move bytes and
/// mint URLs.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    /// Display URL for an object that is readable without credentials.
    fn public_url(&self, key: &str) -> String;

    /// Time-limited URL granting read access to a private object.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|segment| segment.is_empty() || segment == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
