use std::io::Cursor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::blob_id::BlobId;
use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Advisory metadata stored alongside a blob's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMeta {
    /// Original upload filename. Only used for download disposition and
    /// content-type resolution; never interpreted as a path.
    pub filename: String,
    /// Total content size in bytes.
    pub size: u64,
    /// Number of chunk files the content is split into.
    pub chunk_count: u32,
    /// Chunk size the blob was written with, in bytes.
    pub chunk_size: u32,
}

/// Chunked binary storage keyed by opaque ids.
///
/// Blobs are write-once: "replace" at higher layers means write a new blob,
/// repoint the reference, then delete the old id. A reader never observes a
/// blob before its write has fully completed.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a byte slice and return the new blob id.
    async fn put(&self, data: &[u8], filename: &str) -> Result<BlobId, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(reader, filename).await
    }

    /// Store data from an async reader and return the new blob id.
    ///
    /// Must not require the full stream to be buffered in memory; the size
    /// ceiling is enforced while streaming.
    async fn put_stream(&self, reader: BoxReader, filename: &str) -> Result<BlobId, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, id: BlobId) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(id).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a lazily-produced streaming reader.
    async fn get_stream(&self, id: BlobId) -> Result<BoxReader, StorageError>;

    /// Read a blob's advisory metadata.
    async fn meta(&self, id: BlobId) -> Result<BlobMeta, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, id: BlobId) -> Result<bool, StorageError>;

    /// Delete a blob by id.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    /// Callers may treat "already gone" as success.
    async fn delete(&self, id: BlobId) -> Result<bool, StorageError>;
}
