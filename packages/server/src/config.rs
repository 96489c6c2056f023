use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. `"*"` allows any origin. Default: `["*"]`.
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,
    /// Preflight cache lifetime in seconds. Default: 3600.
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory holding the two index files and the `datasets/` folder.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Largest accepted dataset payload in bytes. Also caps contributor fetches.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationConfig {
    /// Distinct verified copies after which the local file is deleted. Default: 5.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Timeout for fetching a contributor's copy. Default: 10 seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

fn default_allow_origins() -> Vec<String> {
    vec!["*".into()]
}
fn default_cors_max_age() -> u64 {
    3600
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8005
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_max_upload_size() -> u64 {
    512 * 1024 * 1024
}
fn default_threshold() -> u32 {
    5
}
fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: default_allow_origins(),
            max_age: default_cors_max_age(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl StorageConfig {
    /// Directory holding the locally hosted dataset files.
    pub fn datasets_dir(&self) -> PathBuf {
        self.data_dir.join("datasets")
    }

    /// Index of dataset records.
    pub fn datasets_index(&self) -> PathBuf {
        self.data_dir.join("datasets.json")
    }

    /// Index of verified contributor claims.
    pub fn contributors_index(&self) -> PathBuf {
        self.data_dir.join("contributors.json")
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("REGISTRY_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., REGISTRY__SERVER__PORT=9000)
            .add_source(
                Environment::with_prefix("REGISTRY")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
