use chrono::Utc;
use common::storage::BlobId;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ExprTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::project;
use crate::error::AppError;

/// CRUD over project metadata records.
///
/// An explicitly constructed handle, injected into handlers through
/// `AppState` rather than referenced as ambient global state. The blob
/// store knows nothing about records; the reference is one-directional.
#[derive(Clone)]
pub struct ProjectRepository {
    db: DatabaseConnection,
}

impl ProjectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new record with no blob attached.
    pub async fn create(&self, name: &str, description: &str) -> Result<project::Model, AppError> {
        validate_fields(name, description)?;

        let now = Utc::now();
        let new_project = project::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.trim().to_string()),
            description: Set(description.trim().to_string()),
            blob_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(new_project.insert(&self.db).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<project::Model, AppError> {
        project::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }

    /// List records, optionally filtered by a case-insensitive substring
    /// match on `name`. A blank filter returns everything, in insertion
    /// order.
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<project::Model>, AppError> {
        let mut select = project::Entity::find();

        if let Some(keyword) = filter {
            let term = escape_like(keyword.trim());
            if !term.is_empty() {
                select = select.filter(
                    Expr::expr(Func::lower(Expr::col(project::Column::Name)))
                        .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
                );
            }
        }

        Ok(select
            .order_by_asc(project::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Update name and description. `blob_id` is left untouched.
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<project::Model, AppError> {
        validate_fields(name, description)?;

        let existing = self.get(id).await?;
        let mut active: project::ActiveModel = existing.into();
        active.name = Set(name.trim().to_string());
        active.description = Set(description.trim().to_string());
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    /// Point a record at a blob. The previous value, if any, is returned
    /// inside the model the caller already holds; retiring the old blob is
    /// the orchestrator's job.
    pub async fn link_blob(&self, id: Uuid, blob_id: BlobId) -> Result<project::Model, AppError> {
        let existing = self.get(id).await?;
        let mut active: project::ActiveModel = existing.into();
        active.blob_id = Set(Some(blob_id.as_uuid()));
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    /// Delete a record, returning it so the caller can cascade on its
    /// `blob_id`.
    pub async fn delete(&self, id: Uuid) -> Result<project::Model, AppError> {
        let existing = self.get(id).await?;
        project::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(existing)
    }
}

/// Reject empty/missing required fields, naming every offender.
fn validate_fields(name: &str, description: &str) -> Result<(), AppError> {
    let mut missing = Vec::new();
    if name.trim().is_empty() {
        missing.push("name");
    }
    if description.trim().is_empty() {
        missing.push("description");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
