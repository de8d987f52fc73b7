use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

use super::blob_id::BlobId;
use super::error::StorageError;
use super::traits::{BlobMeta, BlobStore, BoxReader};

/// Name of the metadata file inside each blob directory.
const META_FILE: &str = "meta.json";

/// Filesystem-backed chunked blob store.
///
/// Each blob lives in its own directory:
/// `{base_path}/{blob_id}/{000000,000001,...}` plus a `meta.json`.
/// Writes stream into `{base_path}/.tmp/{blob_id}` and are published with a
/// single directory rename, so readers never see a partially written blob.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    chunk_size: usize,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Default chunk size (256 KiB).
    pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

    /// Create a new filesystem blob store rooted at `base_path`.
    pub async fn new(
        base_path: impl AsRef<Path>,
        chunk_size: usize,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        if chunk_size == 0 {
            return Err(StorageError::Io(std::io::Error::other(
                "chunk_size must be non-zero",
            )));
        }
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            chunk_size,
            max_size,
        })
    }

    /// Directory holding a published blob.
    fn blob_dir(&self, id: BlobId) -> PathBuf {
        self.base_path.join(id.to_string())
    }

    /// Staging directory for an in-progress write.
    fn staging_dir(&self, id: BlobId) -> PathBuf {
        self.base_path.join(".tmp").join(id.to_string())
    }

    fn chunk_name(index: u32) -> String {
        format!("{index:06}")
    }

    async fn read_meta(&self, id: BlobId) -> Result<BlobMeta, StorageError> {
        let meta_path = self.blob_dir(id).join(META_FILE);
        let raw = match fs::read(&meta_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|e| StorageError::Corrupt(format!("{id}: {e}")))
    }

    /// Stream `reader` into `staging`, returning the meta for the written
    /// chunks. The caller owns staging-dir cleanup on failure.
    async fn write_chunks(
        &self,
        reader: &mut BoxReader,
        staging: &PathBuf,
        filename: &str,
    ) -> Result<BlobMeta, StorageError> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut chunk_count: u32 = 0;
        let mut total: u64 = 0;

        loop {
            // Fill the chunk buffer; short reads do not end a chunk.
            let mut filled = 0;
            while filled < buf.len() {
                let n = reader.read(&mut buf[filled..]).await?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if filled == 0 {
                break;
            }

            total += filled as u64;
            if total > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total,
                    limit: self.max_size,
                });
            }

            let mut chunk = fs::File::create(staging.join(Self::chunk_name(chunk_count))).await?;
            chunk.write_all(&buf[..filled]).await?;
            chunk.flush().await?;
            chunk_count += 1;

            if filled < buf.len() {
                break;
            }
        }

        Ok(BlobMeta {
            filename: filename.to_string(),
            size: total,
            chunk_count,
            chunk_size: u32::try_from(self.chunk_size).unwrap_or(u32::MAX),
        })
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(
        &self,
        mut reader: BoxReader,
        filename: &str,
    ) -> Result<BlobId, StorageError> {
        let id = BlobId::generate();
        let staging = self.staging_dir(id);
        fs::create_dir_all(&staging).await?;

        let result = async {
            let meta = self.write_chunks(&mut reader, &staging, filename).await?;
            let encoded = serde_json::to_vec(&meta)
                .map_err(|e| StorageError::Corrupt(format!("{id}: {e}")))?;
            fs::write(staging.join(META_FILE), encoded).await?;

            // Publish atomically. Until this rename completes, readers can
            // only see the blob id as absent.
            fs::rename(&staging, self.blob_dir(id)).await?;
            Ok(id)
        }
        .await;

        if result.is_err()
            && let Err(e) = fs::remove_dir_all(&staging).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(blob_id = %id, "failed to remove staging dir: {e}");
        }

        result
    }

    async fn get_stream(&self, id: BlobId) -> Result<BoxReader, StorageError> {
        let meta = self.read_meta(id).await?;
        let dir = self.blob_dir(id);

        let paths: Vec<PathBuf> = (0..meta.chunk_count)
            .map(|i| dir.join(Self::chunk_name(i)))
            .collect();

        // Chunks are loaded one at a time as the reader is consumed.
        let stream = futures::stream::iter(paths)
            .then(|path| async move { fs::read(&path).await.map(Bytes::from) });

        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }

    async fn meta(&self, id: BlobId) -> Result<BlobMeta, StorageError> {
        self.read_meta(id).await
    }

    async fn exists(&self, id: BlobId) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_dir(id).join(META_FILE)).await?)
    }

    async fn delete(&self, id: BlobId) -> Result<bool, StorageError> {
        match fs::remove_dir_all(self.blob_dir(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
