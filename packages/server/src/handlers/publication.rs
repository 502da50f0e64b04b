use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::handlers::multipart::read_json_with_images;
use crate::models::publication::{
    PublicationRequest, PublicationResponse, PublicationStatisticsResponse,
    validate_publication_request,
};
use crate::services::assets::{AssetService, validate_images};
use crate::services::publication::{self as publications, PublicationService};
use crate::state::AppState;

fn service(state: &AppState) -> PublicationService<'_> {
    PublicationService::new(&state.db, AssetService::new(&*state.object_store))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Publications",
    operation_id = "createPublication",
    summary = "Create a publication",
    description = "Multipart request with a `publication` JSON part and one or more `images` \
        files. Administrators only.",
    request_body(content_type = "multipart/form-data", description = "`publication` JSON part plus `images` files"),
    responses(
        (status = 201, description = "Publication created", body = PublicationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, ASSET_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id()))]
pub async fn create_publication(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let form =
        read_json_with_images::<PublicationRequest>(&mut multipart, "publication", "images").await?;
    validate_publication_request(&form.payload)?;
    let images = validate_images(form.images, state.config.storage.max_image_size)?;

    let created = service(&state)
        .create(auth_user.identity(), form.payload, images)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(publications::to_response(&state.db, created).await?),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Publications",
    operation_id = "updatePublication",
    summary = "Edit a publication",
    description = "Replaces title, description and the full image set. Administrators only.",
    params(("id" = i32, Path, description = "Publication ID")),
    request_body(content_type = "multipart/form-data", description = "`publication` JSON part plus `images` files"),
    responses(
        (status = 200, description = "Publication updated", body = PublicationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, ASSET_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Publication not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(publication_id = id))]
pub async fn update_publication(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<PublicationResponse>, AppError> {
    auth_user.require_admin()?;

    let form =
        read_json_with_images::<PublicationRequest>(&mut multipart, "publication", "images").await?;
    validate_publication_request(&form.payload)?;
    let images = validate_images(form.images, state.config.storage.max_image_size)?;

    let updated = service(&state).update(id, form.payload, images).await?;
    Ok(Json(publications::to_response(&state.db, updated).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Publications",
    operation_id = "deletePublication",
    summary = "Permanently delete a publication",
    params(("id" = i32, Path, description = "Publication ID")),
    responses(
        (status = 204, description = "Publication deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Publication not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(publication_id = id))]
pub async fn delete_publication(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    service(&state).hard_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/setDeleted/{id}",
    tag = "Publications",
    operation_id = "softDeletePublication",
    summary = "Hide a publication",
    params(("id" = i32, Path, description = "Publication ID")),
    responses(
        (status = 204, description = "Publication hidden"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Publication not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(publication_id = id))]
pub async fn soft_delete_publication(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    service(&state).soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/all",
    tag = "Publications",
    operation_id = "listAllPublications",
    summary = "List every publication, including hidden ones",
    responses(
        (status = 200, description = "All publications", body = Vec<PublicationResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_all(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicationResponse>>, AppError> {
    auth_user.require_admin()?;
    let rows = publications::list_all(&state.db).await?;
    Ok(Json(publications::to_responses(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/all-active",
    tag = "Publications",
    operation_id = "listActivePublications",
    summary = "List visible publications",
    responses(
        (status = 200, description = "Publications that are not deleted", body = Vec<PublicationResponse>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicationResponse>>, AppError> {
    let rows = publications::list_active(&state.db).await?;
    Ok(Json(publications::to_responses(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Publications",
    operation_id = "getPublication",
    summary = "Read a publication",
    description = "Counts one view. Deleted publications are only visible to administrators.",
    params(("id" = i32, Path, description = "Publication ID")),
    responses(
        (status = 200, description = "Publication", body = PublicationResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Publication not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(publication_id = id))]
pub async fn get_publication(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PublicationResponse>, AppError> {
    let viewer = auth_user.as_ref().map(AuthUser::identity);
    let found = publications::view(&state.db, viewer, id).await?;
    Ok(Json(publications::to_response(&state.db, found).await?))
}

#[utoipa::path(
    post,
    path = "/increment/{id}",
    tag = "Publications",
    operation_id = "incrementPublicationViews",
    summary = "Count one view of a publication",
    params(("id" = i32, Path, description = "Publication ID")),
    responses(
        (status = 204, description = "View counted"),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Publication not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state), fields(publication_id = id))]
pub async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    publications::increment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/statistics",
    tag = "Publications",
    operation_id = "publicationStatistics",
    summary = "View counts of every publication",
    responses(
        (status = 200, description = "Statistics", body = Vec<PublicationStatisticsResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn statistics(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicationStatisticsResponse>>, AppError> {
    auth_user.require_admin()?;
    Ok(Json(publications::statistics(&state.db).await?))
}
