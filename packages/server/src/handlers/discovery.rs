use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::query::AppQuery;
use crate::models::supplier::{
    CategoryQuery, LocationQuery, NameQuery, SupplierNameResponse, SupplierResponse,
};
use crate::services::{discovery, supplier};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/allAccepted",
    tag = "Discovery",
    operation_id = "listAcceptedSuppliers",
    summary = "List accepted suppliers",
    responses(
        (status = 200, description = "Accepted, non-deleted suppliers", body = Vec<SupplierResponse>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn all_accepted(
    State(state): State<AppState>,
) -> Result<Json<Vec<SupplierResponse>>, AppError> {
    let rows = discovery::list_accepted(&state.db).await?;
    Ok(Json(supplier::to_responses(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/allNames",
    tag = "Discovery",
    operation_id = "listAcceptedSupplierNames",
    summary = "Names of accepted suppliers",
    description = "`{id, name}` pairs, for autocomplete.",
    responses(
        (status = 200, description = "Names", body = Vec<SupplierNameResponse>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn all_names(
    State(state): State<AppState>,
) -> Result<Json<Vec<SupplierNameResponse>>, AppError> {
    let names = discovery::accepted_names(&state.db)
        .await?
        .into_iter()
        .map(|(id, name)| SupplierNameResponse { id, name })
        .collect();
    Ok(Json(names))
}

#[utoipa::path(
    get,
    path = "/searchByName",
    tag = "Discovery",
    operation_id = "searchSuppliersByName",
    summary = "Search accepted suppliers by name",
    description = "Case-insensitive substring match.",
    params(NameQuery),
    responses(
        (status = 200, description = "Matching suppliers", body = Vec<SupplierResponse>),
        (status = 400, description = "Blank query (INVALID_QUERY)", body = ErrorBody),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No match (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state), fields(name = %query.name))]
pub async fn search_by_name(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NameQuery>,
) -> Result<Json<Vec<SupplierResponse>>, AppError> {
    let rows = discovery::search_by_name(&state.db, &query.name).await?;
    Ok(Json(supplier::to_responses(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/searchByCategory",
    tag = "Discovery",
    operation_id = "searchSuppliersByCategory",
    summary = "Accepted suppliers of a category",
    description = "The category is matched by name, ignoring case. An exact match wins over a \
        partial one.",
    params(CategoryQuery),
    responses(
        (status = 200, description = "Suppliers of the category", body = Vec<SupplierResponse>),
        (status = 400, description = "Unknown category (INVALID_QUERY)", body = ErrorBody),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No accepted supplier in the category (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state), fields(category = %query.category))]
pub async fn search_by_category(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CategoryQuery>,
) -> Result<Json<Vec<SupplierResponse>>, AppError> {
    let rows = discovery::search_by_category(&state.db, &query.category).await?;
    Ok(Json(supplier::to_responses(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/searchByLocation",
    tag = "Discovery",
    operation_id = "searchSuppliersByLocation",
    summary = "Accepted suppliers near a point",
    description = "Reverse-geocodes the coordinates and looks for suppliers in the same city, \
        then province, then country. An empty list means nothing matched at any level.",
    params(LocationQuery),
    responses(
        (status = 200, description = "Nearby suppliers, possibly none", body = Vec<SupplierResponse>),
        (status = 204, description = "The coordinates could not be placed"),
        (status = 400, description = "Missing or out-of-range coordinates (INVALID_QUERY)", body = ErrorBody),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state), fields(lat = query.lat, lng = query.lng))]
pub async fn search_by_location(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LocationQuery>,
) -> Result<Json<Vec<SupplierResponse>>, AppError> {
    let rows =
        discovery::search_by_location(&state.db, &*state.geocoder, query.lat, query.lng).await?;
    Ok(Json(supplier::to_responses(&state.db, rows).await?))
}
