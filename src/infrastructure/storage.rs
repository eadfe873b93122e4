use async_trait::async_trait;

use crate::errors::StorageError;

pub mod s3;

/// Key-addressed blob store the post images are written to.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Writes `body` under `key` and returns the object's public URL.
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError>;

    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    async fn check_connection(&self) -> Result<(), StorageError>;
}
