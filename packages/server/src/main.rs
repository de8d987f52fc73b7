use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use tracing::{Level, info};

use server::config::AppConfig;
use server::database::init_db;
use server::repository::ProjectRepository;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database.url).await?;

    let blob_store = FilesystemBlobStore::new(
        &config.storage.root,
        config.storage.chunk_size,
        config.storage.max_blob_size,
    )
    .await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        projects: ProjectRepository::new(db),
        blob_store: Arc::new(blob_store),
        config,
    };

    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
