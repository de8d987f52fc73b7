mod blob_id;
mod error;
mod traits;

pub mod filesystem;

pub use blob_id::BlobId;
pub use error::StorageError;
pub use traits::{BlobMeta, BlobStore, BoxReader};
