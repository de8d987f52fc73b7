use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;
use crate::repository::ProjectRepository;

#[derive(Clone)]
pub struct AppState {
    pub projects: ProjectRepository,
    pub blob_store: Arc<dyn BlobStore>,
    pub config: AppConfig,
}
