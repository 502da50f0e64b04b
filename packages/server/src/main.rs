use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemObjectStore;
use common::storage::s3::S3ObjectStore;
use common::storage::{MemoryObjectStore, ObjectStore};
use tracing::{Level, info, warn};

use ecosystem_server::config::{AppConfig, StorageBackend, StorageConfig};
use ecosystem_server::services::identity::GoogleIdentityVerifier;
use ecosystem_server::services::location::GoogleGeocoder;
use ecosystem_server::state::AppState;
use ecosystem_server::{build_router, database, seed};

async fn build_object_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.backend {
        StorageBackend::Filesystem => {
            let fs = &config.filesystem;
            info!(root = %fs.root.display(), "Using filesystem object storage");
            Arc::new(
                FilesystemObjectStore::new(
                    fs.root.clone(),
                    fs.public_url.clone(),
                    config.max_image_size,
                )
                .await
                .context("Failed to initialise filesystem storage")?,
            )
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .context("storage.backend is 's3' but the [storage.s3] section is missing")?;
            info!(bucket = %s3.bucket, "Using S3 object storage");
            Arc::new(
                S3ObjectStore::new(s3, config.max_image_size)
                    .context("Failed to initialise S3 storage")?,
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory object storage; uploaded images are lost on restart");
            Arc::new(MemoryObjectStore::new(config.filesystem.public_url.clone()))
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    if config.auth.jwt_secret.trim().is_empty() {
        anyhow::bail!("auth.jwt_secret must be set (ECOSISTEMA__AUTH__JWT_SECRET)");
    }
    if config.geocoding.api_key.is_empty() {
        warn!("geocoding.api_key is empty; location search will answer 204");
    }

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    seed::ensure_indexes(&db).await?;

    let object_store = build_object_store(&config.storage).await?;
    let geocoder = Arc::new(GoogleGeocoder::new(&config.geocoding)?);
    let identity_verifier = Arc::new(GoogleIdentityVerifier::new(&config.auth)?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;

    let state = AppState {
        db,
        config,
        object_store,
        geocoder,
        identity_verifier,
    };
    let app = build_router(state);

    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
