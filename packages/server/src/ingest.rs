//! Upload/replace orchestration: the sequential state machine that ties a
//! metadata record to its blob.
//!
//! There is no rollback transaction. Each step can fail on its own, leaving
//! a named partial state that the rest of the system tolerates on read:
//! metadata without a blob (`PendingBlob`), or an unlinked blob in the
//! store. Neither is auto-repaired here.

use std::path::PathBuf;

use common::storage::{BlobId, BlobStore, BoxReader};
use tracing::warn;
use uuid::Uuid;

use crate::entity::project;
use crate::error::AppError;
use crate::repository::ProjectRepository;

/// A file field spooled to disk by the multipart layer, with the upload
/// size ceiling already enforced.
#[derive(Debug)]
pub struct StagedUpload {
    /// Original filename from the multipart field.
    pub filename: String,
    /// Temp file holding the payload; the handler removes it afterwards.
    pub temp_path: PathBuf,
}

/// Blob linkage state of a project record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Metadata exists, no blob linked: upload incomplete, not corruption.
    PendingBlob,
    /// A blob id is linked; it existed at the time of the last write.
    Linked,
}

pub fn link_state(project: &project::Model) -> LinkState {
    if project.blob_id.is_some() {
        LinkState::Linked
    } else {
        LinkState::PendingBlob
    }
}

/// Upload: validate, create the record, write the blob, link it.
///
/// Failure after record creation leaves the record in `PendingBlob`;
/// failure after the blob write leaves an unlinked blob. Both are logged
/// and the error propagates to the boundary.
pub async fn upload_project(
    repo: &ProjectRepository,
    store: &dyn BlobStore,
    name: &str,
    description: &str,
    file: Option<&StagedUpload>,
) -> Result<project::Model, AppError> {
    let staged = file.ok_or_else(|| AppError::Validation("No project file uploaded".into()))?;

    let record = repo.create(name, description).await?;

    let blob_id = match store
        .put_stream(open_staged(staged).await?, &staged.filename)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            warn!(project_id = %record.id, "blob write failed, record left without file: {e}");
            return Err(e.into());
        }
    };

    match repo.link_blob(record.id, blob_id).await {
        Ok(linked) => Ok(linked),
        Err(e) => {
            warn!(project_id = %record.id, blob_id = %blob_id, "link failed, blob left unreferenced");
            Err(e)
        }
    }
}

/// Edit: update metadata; when a replacement file is present, write the new
/// blob, repoint the record, then retire the old blob.
///
/// Editing without a file leaves `blob_id` unchanged. A failed delete of
/// the old blob is a non-fatal leak: the record is already correctly
/// repointed, so it is logged and never reported to the caller.
pub async fn edit_project(
    repo: &ProjectRepository,
    store: &dyn BlobStore,
    id: Uuid,
    name: &str,
    description: &str,
    file: Option<&StagedUpload>,
) -> Result<project::Model, AppError> {
    let updated = repo.update(id, name, description).await?;

    let Some(staged) = file else {
        return Ok(updated);
    };

    let old_blob = updated.blob_id.map(BlobId::from);

    let new_blob = store
        .put_stream(open_staged(staged).await?, &staged.filename)
        .await?;

    let relinked = match repo.link_blob(id, new_blob).await {
        Ok(model) => model,
        Err(e) => {
            warn!(project_id = %id, blob_id = %new_blob, "relink failed, new blob left unreferenced");
            return Err(e);
        }
    };

    if let Some(old) = old_blob {
        match store.delete(old).await {
            Ok(true) => {}
            Ok(false) => warn!(blob_id = %old, "old blob already absent during replace"),
            Err(e) => warn!(blob_id = %old, "failed to delete old blob during replace: {e}"),
        }
    }

    Ok(relinked)
}

/// Delete: remove the record, then cascade to its blob if one is linked.
pub async fn delete_project(
    repo: &ProjectRepository,
    store: &dyn BlobStore,
    id: Uuid,
) -> Result<project::Model, AppError> {
    let deleted = repo.delete(id).await?;

    if let Some(blob_id) = deleted.blob_id.map(BlobId::from) {
        match store.delete(blob_id).await {
            Ok(true) => {}
            Ok(false) => warn!(blob_id = %blob_id, "blob already absent during cascade delete"),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(deleted)
}

async fn open_staged(staged: &StagedUpload) -> Result<BoxReader, AppError> {
    let file = tokio::fs::File::open(&staged.temp_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to reopen staged upload: {e}")))?;
    Ok(Box::new(file))
}
