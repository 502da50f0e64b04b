use std::sync::Arc;

use common::storage::ObjectStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::identity::IdentityVerifier;
use crate::services::location::Geocoder;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub object_store: Arc<dyn ObjectStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub identity_verifier: Arc<dyn IdentityVerifier>,
}
