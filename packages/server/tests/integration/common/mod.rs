use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde_json::Value;
use tempfile::TempDir;

use registry::config::{AppConfig, CorsConfig, ServerConfig, StorageConfig, VerificationConfig};
use registry::state::AppState;

pub mod routes {
    pub const DATASETS: &str = "/api/datasets";
    pub const UPLOAD: &str = "/api/uploadDataset";
    pub const DATASET: &str = "/api/dataset";
    pub const CONTRIBUTE: &str = "/api/contribute";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn dataset(id: &str) -> String {
        format!("/api/dataset/{id}")
    }

    pub fn file(id: &str) -> String {
        format!("/api/files/{id}")
    }
}

pub const TRAFFIC_COUNTS: &[u8] = b"intersection,hour,count\nMain/1st,08,412\nMain/2nd,08,388\n";

type Copies = Arc<RwLock<HashMap<String, Vec<u8>>>>;

/// A stand-in for contributors' own hosting: serves whatever bytes were
/// placed under a name, 404 otherwise.
pub struct Mirror {
    addr: SocketAddr,
    copies: Copies,
}

impl Mirror {
    async fn spawn() -> Self {
        let copies: Copies = Arc::default();
        let app = axum::Router::new()
            .route("/{name}", axum::routing::get(serve_copy))
            .with_state(copies.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mirror");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, copies }
    }

    /// Publish `bytes` and return the public link.
    pub fn host(&self, name: &str, bytes: &[u8]) -> String {
        self.copies
            .write()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        self.link(name)
    }

    pub fn link(&self, name: &str) -> String {
        format!("http://{}/{}", self.addr, name)
    }
}

async fn serve_copy(
    State(copies): State<Copies>,
    UrlPath(name): UrlPath<String>,
) -> impl IntoResponse {
    match copies.read().unwrap().get(&name) {
        Some(bytes) => (StatusCode::OK, bytes.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A running registry backed by a temporary data directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub mirror: Mirror,
    pub config: AppConfig,
    data_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

pub fn test_config(data_dir: &Path) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig::default(),
        },
        storage: StorageConfig {
            data_dir: data_dir.to_path_buf(),
            max_upload_size: 64 * 1024,
        },
        verification: VerificationConfig {
            threshold: 5,
            fetch_timeout_secs: 5,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data dir");
        Self::spawn_in(data_dir).await
    }

    /// Start a server over an existing data directory.
    pub async fn spawn_in(data_dir: TempDir) -> Self {
        let config = test_config(data_dir.path());
        let state = AppState::init(config.clone())
            .await
            .expect("Failed to initialise registry");
        let app = registry::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::builder()
                .redirect(Policy::none())
                .build()
                .expect("Failed to build client"),
            mirror: Mirror::spawn().await,
            config,
            data_dir,
        }
    }

    /// Shut down and hand back the data directory for a restart.
    pub fn into_data_dir(self) -> TempDir {
        self.data_dir
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_dir.path().to_path_buf()
    }

    /// Local path of a stored dataset file.
    pub fn stored_file(&self, stored_filename: &str) -> PathBuf {
        self.config.storage.datasets_dir().join(stored_filename)
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

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");
        TestResponse::from_response(res).await
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

    /// Send an upload form. `None` omits the field entirely.
    pub async fn upload_form(
        &self,
        title: Option<&str>,
        description: Option<&str>,
        file: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut form = reqwest::multipart::Form::new();
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }
        if let Some(description) = description {
            form = form.text("description", description.to_string());
        }
        if let Some((file_name, bytes)) = file {
            let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                .file_name(file_name.to_string())
                .mime_str("text/csv")
                .expect("Failed to set MIME type");
            form = form.part("file", part);
        }

        let res = self
            .client
            .post(self.url(routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");
        TestResponse::from_response(res).await
    }

    /// Upload a dataset and return its JSON record.
    pub async fn upload(&self, title: &str, file_name: &str, bytes: &[u8]) -> Value {
        let res = self
            .upload_form(
                Some(title),
                Some(&format!("{title} description")),
                Some((file_name, bytes)),
            )
            .await;
        assert_eq!(res.status, 201, "Upload failed: {}", res.text());
        res.body["dataset"].clone()
    }

    pub async fn contribute(&self, dataset_id: &str, email: &str, host_link: &str) -> TestResponse {
        self.post(
            routes::CONTRIBUTE,
            &serde_json::json!({
                "datasetId": dataset_id,
                "name": "Contributor",
                "email": email,
                "hostLink": host_link,
            }),
        )
        .await
    }

    /// The listed entry for `id`, if any.
    pub async fn listed(&self, id: &str) -> Option<Value> {
        let res = self.get(routes::DATASETS).await;
        assert_eq!(res.status, 200, "List failed: {}", res.text());
        res.body
            .as_array()
            .expect("list should be an array")
            .iter()
            .find(|d| d["id"] == id)
            .cloned()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            bytes,
            body,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}
