pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{ServerConfig, StorageBackend};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ecosistema API",
        version = "1.0.0",
        description = "Supplier directory: review workflow, discovery and publications"
    ),
    tags(
        (name = "Auth", description = "Sign-in"),
        (name = "Users", description = "Current user and user statistics"),
        (name = "Suppliers", description = "Supplier submission and review workflow"),
        (name = "Discovery", description = "Search over accepted suppliers"),
        (name = "Publications", description = "Informational publications"),
        (name = "Reference Data", description = "Countries, provinces and categories"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors
        .allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.cors.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state))
        .split_for_parts();

    let cors = cors_layer(&state.config.server);
    let media = (state.config.storage.backend == StorageBackend::Filesystem).then(|| {
        let fs = &state.config.storage.filesystem;
        (fs.mount_path.clone(), ServeDir::new(&fs.root))
    });

    let mut router = router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    // Uploaded images are public, so they are served outside the auth gate.
    if let Some((mount_path, dir)) = media {
        router = router.nest_service(&mount_path, dir);
    }

    router.layer(cors).layer(TraceLayer::new_for_http())
}
