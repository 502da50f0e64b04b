use std::path::PathBuf;

use common::storage::s3::S3Config;
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
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// OAuth client id that Google ID tokens must be issued for.
    pub google_client_id: String,
    /// Emails promoted to administrator on first sign-in.
    #[serde(default)]
    pub admin_emails: Vec<String>,
    pub tokeninfo_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemStorageConfig {
    pub root: PathBuf,
    /// Public base URL; the server mounts `root` under this URL's path.
    pub public_url: String,
    pub mount_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Upper bound for a single uploaded image, in bytes.
    pub max_image_size: u64,
    pub filesystem: FilesystemStorageConfig,
    pub s3: Option<S3Config>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub geocoding: GeocodingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://ecosistema.db?mode=rwc")?
            .set_default("auth.token_ttl_days", 7)?
            .set_default("auth.google_client_id", "")?
            .set_default(
                "auth.tokeninfo_url",
                "https://oauth2.googleapis.com/tokeninfo",
            )?
            .set_default("auth.timeout_secs", 10)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.max_image_size", 5 * 1024 * 1024)?
            .set_default("storage.filesystem.root", "./media")?
            .set_default(
                "storage.filesystem.public_url",
                "http://127.0.0.1:3000/media",
            )?
            .set_default("storage.filesystem.mount_path", "/media")?
            .set_default("geocoding.api_key", "")?
            .set_default(
                "geocoding.base_url",
                "https://maps.googleapis.com/maps/api/geocode/json",
            )?
            .set_default("geocoding.timeout_secs", 10)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., ECOSISTEMA__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("ECOSISTEMA")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_emails")
                    .with_list_parse_key("server.cors.allow_origins"),
            )
            .build()?;

        s.try_deserialize()
    }
}
