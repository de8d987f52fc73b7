use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared secret for the admin upload surface. No default; must be
    /// supplied via config file or `ARCHIVE__AUTH__ADMIN_TOKEN`.
    pub admin_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the blob store.
    pub root: PathBuf,
    /// Per-upload size ceiling in bytes.
    pub max_blob_size: u64,
    /// Chunk file size in bytes.
    pub chunk_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://data/archive.db?mode=rwc")?
            .set_default("storage.root", "./data/blobs")?
            .set_default("storage.max_blob_size", 10 * 1024 * 1024)? // 10 MiB
            .set_default("storage.chunk_size", 256 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., ARCHIVE__AUTH__ADMIN_TOKEN)
            .add_source(Environment::with_prefix("ARCHIVE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
