use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

/// Opaque identifier for a stored blob, assigned by the store on write.
///
/// Backed by a UUIDv7 so ids sort roughly by creation time on disk listings.
/// Two writes always produce two distinct ids, even for identical content;
/// blobs are never shared between owners.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId(Uuid);

impl BlobId {
    /// Mint a fresh id for a new blob.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse the canonical hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| StorageError::InvalidId(format!("{s:?}: {e}")))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for BlobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<BlobId> for Uuid {
    fn from(id: BlobId) -> Self {
        id.0
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.0)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BlobId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BlobId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
