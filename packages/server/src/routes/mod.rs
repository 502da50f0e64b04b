use axum::middleware;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers::multipart::image_upload_body_limit;
use crate::handlers::{auth, discovery, publication, reference, supplier};
use crate::middleware::auth::authenticate;
use crate::state::AppState;

/// Everything under `/api`.
///
/// Routes outside `/auth` pass through the token gate, which rejects invalid tokens
/// and lets anonymous requests reach the public reads: discovery, reference data and
/// visible suppliers and publications. Every other handler requires an [`AuthUser`].
///
/// [`AuthUser`]: crate::extractors::auth::AuthUser
pub fn api_routes(state: &AppState) -> OpenApiRouter<AppState> {
    let gated = OpenApiRouter::new()
        .nest("/users", user_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/publications", publication_routes())
        .nest("/countries", country_routes())
        .nest("/provinces", province_routes())
        .nest("/categories", category_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .merge(gated)
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(auth::google_auth))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::me))
        .routes(routes!(auth::user_statistics))
}

fn supplier_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(supplier::list_by_status, supplier::create_supplier))
        .routes(routes!(
            supplier::get_supplier,
            supplier::update_supplier,
            supplier::delete_supplier
        ))
        .routes(routes!(supplier::soft_delete_supplier))
        .routes(routes!(supplier::review_supplier))
        .routes(routes!(supplier::my_suppliers))
        .routes(routes!(supplier::my_feedback))
        .routes(routes!(supplier::statistics))
        .routes(routes!(discovery::all_accepted))
        .routes(routes!(discovery::all_names))
        .routes(routes!(discovery::search_by_name))
        .routes(routes!(discovery::search_by_category))
        .routes(routes!(discovery::search_by_location))
        .layer(image_upload_body_limit())
}

fn publication_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(publication::create_publication))
        .routes(routes!(
            publication::get_publication,
            publication::update_publication,
            publication::delete_publication
        ))
        .routes(routes!(publication::soft_delete_publication))
        .routes(routes!(publication::list_all))
        .routes(routes!(publication::list_active))
        .routes(routes!(publication::increment_views))
        .routes(routes!(publication::statistics))
        .layer(image_upload_body_limit())
}

fn country_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(reference::list_countries, reference::create_country))
        .routes(routes!(reference::list_provinces))
}

fn province_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(reference::create_province))
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(reference::list_categories, reference::create_category))
        .routes(routes!(reference::get_category, reference::update_category))
        .layer(image_upload_body_limit())
}
