//! The object store capability consumed by the worker.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Blob storage addressed by key.
///
/// Implementations must make `put` an overwrite: writing to an existing key
/// replaces the object (last writer wins), which is what keeps duplicate
/// deliveries harmless.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's bytes. `NotFound` when the key does not exist.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Write an object, replacing any previous version at the key.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
