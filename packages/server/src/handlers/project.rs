use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::ingest::{self, StagedUpload};
use crate::models::project::{ProjectListQuery, ProjectListResponse, ProjectResponse};
use crate::state::AppState;

/// Body limit for multipart routes: the blob ceiling plus form overhead.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(12 * 1024 * 1024)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Projects",
    operation_id = "uploadProject",
    summary = "Upload a new project",
    description = "Creates a project from multipart fields `name`, `description` and `file`. \
        The file is required; an upload without one persists nothing. Admin only.",
    request_body(content_type = "multipart/form-data", description = "Project metadata and file"),
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Missing file or fields (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Internal failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("admin_token" = [])),
)]
#[instrument(skip(_admin, state, multipart))]
pub async fn upload_project(
    _admin: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_project_form(multipart, state.config.storage.max_blob_size).await?;

    let result = ingest::upload_project(
        &state.projects,
        &*state.blob_store,
        &form.name,
        &form.description,
        form.file.as_ref(),
    )
    .await;

    cleanup_staged(form.file.as_ref()).await;
    let model = result?;

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List or search projects",
    description = "Returns all project records, optionally filtered by a case-insensitive \
        substring match on the name. An empty keyword returns the unfiltered list.",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Project list", body = ProjectListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let records = state.projects.list(query.search.as_deref()).await?;

    let total = records.len() as u64;
    let projects = records.into_iter().map(ProjectResponse::from).collect();

    Ok(Json(ProjectListResponse { projects, total }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get a project by ID",
    params(("id" = String, Path, description = "Project ID (UUID)")),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, AppError> {
    let id = parse_project_id(&id)?;
    let model = state.projects.get(id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Projects",
    operation_id = "updateProject",
    summary = "Edit a project",
    description = "Updates `name` and `description` (both required) and optionally replaces the \
        stored file. Without a replacement file the existing blob link is preserved; with one, \
        the record is repointed and the old blob retired.",
    params(("id" = String, Path, description = "Project ID (UUID)")),
    request_body(content_type = "multipart/form-data", description = "Project metadata and optional file"),
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(id))]
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ProjectResponse>, AppError> {
    let id = parse_project_id(&id)?;
    let form = read_project_form(multipart, state.config.storage.max_blob_size).await?;

    let result = ingest::edit_project(
        &state.projects,
        &*state.blob_store,
        id,
        &form.name,
        &form.description,
        form.file.as_ref(),
    )
    .await;

    cleanup_staged(form.file.as_ref()).await;
    let model = result?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project",
    description = "Deletes the record and cascades to its stored file, if any.",
    params(("id" = String, Path, description = "Project ID (UUID)")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_project_id(&id)?;
    ingest::delete_project(&state.projects, &*state.blob_store, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn parse_project_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid project ID".into()))
}

/// Fields collected from a project multipart form.
struct ProjectForm {
    name: String,
    description: String,
    file: Option<StagedUpload>,
}

async fn read_project_form(
    mut multipart: Multipart,
    max_size: u64,
) -> Result<ProjectForm, AppError> {
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut file: Option<StagedUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read name: {e}")))?;
                name = Some(text);
            }
            Some("description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read description: {e}")))?;
                description = Some(text);
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        AppError::Validation("File field must have a filename".into())
                    })?;
                file = Some(stage_upload_field(field, filename, max_size).await?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(ProjectForm {
        name: name.unwrap_or_default(),
        description: description.unwrap_or_default(),
        file,
    })
}

/// Spool a multipart file field to a temp file, enforcing the size ceiling
/// while reading. The blob store never sees an oversized stream.
async fn stage_upload_field(
    mut field: axum::extract::multipart::Field<'_>,
    filename: String,
    max_size: u64,
) -> Result<StagedUpload, AppError> {
    let temp_path = std::env::temp_dir().join(format!("archive-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(StagedUpload {
            filename,
            temp_path: temp_path.clone(),
        })
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }

    result
}

/// Best effort.
async fn cleanup_staged(staged: Option<&StagedUpload>) {
    if let Some(staged) = staged {
        let _ = tokio::fs::remove_file(&staged.temp_path).await;
    }
}
