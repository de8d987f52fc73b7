use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::{BlobId, StorageError};
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::handlers::project::parse_project_id;
use crate::state::AppState;
use crate::utils::filename::{attachment_disposition, content_type_for, file_extension};

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Projects",
    operation_id = "downloadProject",
    summary = "Download a project's stored file",
    description = "Streams the blob linked to the project. The download is named after the \
        project (with the stored file's extension); `.pdf` is served as `application/pdf`, \
        everything else as a generic byte stream. A project without a file yields NO_FILE, \
        distinct from a missing project (NOT_FOUND). A record pointing at a blob the store no \
        longer has yields INCONSISTENT.",
    params(("id" = String, Path, description = "Project ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "Missing project or no file attached (NOT_FOUND, NO_FILE)", body = ErrorBody),
        (status = 500, description = "Dangling blob reference (INCONSISTENT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn download_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_project_id(&id)?;
    let project = state.projects.get(id).await?;

    let Some(blob_id) = project.blob_id.map(BlobId::from) else {
        return Err(AppError::NoFile("Project has no file attached".into()));
    };

    let meta = state
        .blob_store
        .meta(blob_id)
        .await
        .map_err(|e| inconsistent_on_missing(e, id, blob_id))?;
    let reader = state
        .blob_store
        .get_stream(blob_id)
        .await
        .map_err(|e| inconsistent_on_missing(e, id, blob_id))?;

    let body = Body::from_stream(ReaderStream::new(reader));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&meta.filename))
        .header(header::CONTENT_LENGTH, meta.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&project.name, file_extension(&meta.filename)),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

/// A blob missing from the store while still referenced by a record is a
/// dangling reference from a prior partial failure, not a 404.
fn inconsistent_on_missing(err: StorageError, project_id: Uuid, blob_id: BlobId) -> AppError {
    match err {
        StorageError::NotFound(_) => AppError::Inconsistent(format!(
            "project {project_id} references missing blob {blob_id}"
        )),
        other => other.into(),
    }
}
