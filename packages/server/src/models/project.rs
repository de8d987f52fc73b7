use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::project;

/// Response DTO for a single project record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    /// Project ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    #[schema(example = "Archive A")]
    pub name: String,
    #[schema(example = "Collected design documents for Archive A")]
    pub description: String,
    /// Blob store id of the attached file, if one is linked.
    pub blob_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response DTO for listing projects.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
    pub total: u64,
}

/// Query parameters for the list endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProjectListQuery {
    /// Case-insensitive substring to match against project names.
    /// Empty or absent returns the unfiltered list.
    pub search: Option<String>,
}

impl From<project::Model> for ProjectResponse {
    fn from(model: project::Model) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name,
            description: model.description,
            blob_id: model.blob_id.map(|id| id.to_string()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
