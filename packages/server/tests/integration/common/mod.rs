use std::net::SocketAddr;
use std::sync::Arc;

use ::common::storage::filesystem::FilesystemBlobStore;
use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use server::repository::ProjectRepository;
use server::state::AppState;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub mod routes {
    pub const PROJECTS: &str = "/api/v1/projects";

    pub fn project(id: &str) -> String {
        format!("/api/v1/projects/{id}")
    }

    pub fn download(id: &str) -> String {
        format!("/api/v1/projects/{id}/download")
    }
}

/// A running test server backed by a per-test SQLite file and blob
/// directory inside a temp dir.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        // A file-backed database: every pooled connection must see the
        // same data, which :memory: does not provide.
        let db_path = dir.path().join("archive.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let blob_root = dir.path().join("blobs");
        let blob_store = FilesystemBlobStore::new(&blob_root, 1024, 10 * 1024 * 1024)
            .await
            .expect("Failed to initialize blob store");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url.clone(),
            },
            auth: AuthConfig {
                admin_token: ADMIN_TOKEN.to_string(),
            },
            storage: StorageConfig {
                root: blob_root,
                max_blob_size: 10 * 1024 * 1024,
                chunk_size: 1024,
            },
        };

        let state = AppState {
            projects: ProjectRepository::new(db.clone()),
            blob_store: Arc::new(blob_store),
            config: app_config,
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// GET returning the raw response, for header and byte assertions.
    pub async fn get_raw(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form_with_token(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form_without_token(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_form(&self, path: &str, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart PUT request");

        TestResponse::from_response(res).await
    }

    /// Upload a project via the API and return its `id`.
    pub async fn create_project(&self, name: &str, filename: &str, bytes: &[u8]) -> String {
        let form = project_form(name, "integration test project", Some((filename, bytes)));
        let res = self
            .post_form_with_token(routes::PROJECTS, form, ADMIN_TOKEN)
            .await;
        assert_eq!(res.status, 201, "create_project failed: {}", res.text);
        res.id()
    }
}

/// Build a project multipart form with `name`, `description` and an
/// optional `file` part.
pub fn project_form(
    name: &str,
    description: &str,
    file: Option<(&str, &[u8])>,
) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("description", description.to_string());

    if let Some((filename, bytes)) = file {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .expect("Failed to set MIME type");
        form = form.part("file", part);
    }

    form
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }

    pub fn code(&self) -> &str {
        self.body["code"]
            .as_str()
            .expect("error body should contain 'code'")
    }
}
