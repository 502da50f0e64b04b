use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::multipart::read_json_with_images;
use crate::models::supplier::{
    ReviewRequest, SupplierFeedbackResponse, SupplierRequest, SupplierResponse,
    SupplierStatisticsResponse, SuppliersByStatusResponse, validate_supplier_request,
};
use crate::services::assets::{AssetService, validate_images};
use crate::services::supplier::{self as suppliers, SupplierWorkflow};
use crate::state::AppState;

fn workflow(state: &AppState) -> SupplierWorkflow<'_> {
    SupplierWorkflow::new(&state.db, AssetService::new(&*state.object_store))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Suppliers",
    operation_id = "listSuppliersByStatus",
    summary = "List suppliers grouped by review status",
    description = "Every non-deleted supplier, bucketed into new, review, approved, denied and \
        changes-made. Administrators only.",
    responses(
        (status = 200, description = "Suppliers by status", body = SuppliersByStatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn list_by_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SuppliersByStatusResponse>, AppError> {
    auth_user.require_admin()?;
    Ok(Json(suppliers::grouped_by_status(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Suppliers",
    operation_id = "createSupplier",
    summary = "Submit a supplier for review",
    description = "Multipart request with a `supplier` JSON part and one or more `images` files \
        (jpg, jpeg, png, gif or bmp, at most 5 MiB each). The supplier starts in \
        `REVISION_INICIAL`. A user may own at most 3 non-deleted suppliers.",
    request_body(content_type = "multipart/form-data", description = "`supplier` JSON part plus `images` files"),
    responses(
        (status = 201, description = "Supplier created", body = SupplierResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, ASSET_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Supplier quota reached (QUOTA_EXCEEDED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id()))]
pub async fn create_supplier(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_regular()?;

    let form = read_json_with_images::<SupplierRequest>(&mut multipart, "supplier", "images").await?;
    validate_supplier_request(&form.payload)?;
    let images = validate_images(form.images, state.config.storage.max_image_size)?;

    let created = workflow(&state)
        .create(auth_user.identity(), form.payload, images)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(suppliers::to_response(&state.db, created).await?),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Suppliers",
    operation_id = "getSupplier",
    summary = "Get a supplier by ID",
    description = "Soft-deleted suppliers are only visible to administrators.",
    params(("id" = i32, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier", body = SupplierResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Supplier not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(supplier_id = id))]
pub async fn get_supplier(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SupplierResponse>, AppError> {
    let viewer = auth_user.as_ref().map(AuthUser::identity);
    let found = suppliers::find_visible(&state.db, viewer, id).await?;
    Ok(Json(suppliers::to_response(&state.db, found).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Suppliers",
    operation_id = "updateSupplier",
    summary = "Edit an own supplier",
    description = "Replaces every field and the full image set, and sends the supplier back to \
        `REVISION_INICIAL`. Only the owner may edit.",
    params(("id" = i32, Path, description = "Supplier ID")),
    request_body(content_type = "multipart/form-data", description = "`supplier` JSON part plus `images` files"),
    responses(
        (status = 200, description = "Supplier updated", body = SupplierResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, ASSET_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Supplier not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(supplier_id = id, user_id = auth_user.user_id()))]
pub async fn update_supplier(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<SupplierResponse>, AppError> {
    let form = read_json_with_images::<SupplierRequest>(&mut multipart, "supplier", "images").await?;
    validate_supplier_request(&form.payload)?;
    let images = validate_images(form.images, state.config.storage.max_image_size)?;

    let updated = workflow(&state)
        .update(auth_user.identity(), id, form.payload, images)
        .await?;

    Ok(Json(suppliers::to_response(&state.db, updated).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Suppliers",
    operation_id = "deleteSupplier",
    summary = "Permanently delete a supplier",
    description = "Removes the supplier, its image records and the stored image files. \
        Administrators only.",
    params(("id" = i32, Path, description = "Supplier ID")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Supplier not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(supplier_id = id))]
pub async fn delete_supplier(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    workflow(&state).hard_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/deleted",
    tag = "Suppliers",
    operation_id = "softDeleteSupplier",
    summary = "Hide a supplier",
    description = "Marks the supplier as deleted without touching its review status. \
        Allowed for the owner and administrators.",
    params(("id" = i32, Path, description = "Supplier ID")),
    responses(
        (status = 204, description = "Supplier hidden"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Supplier not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(supplier_id = id))]
pub async fn soft_delete_supplier(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    workflow(&state)
        .soft_delete(auth_user.identity(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/feedback/{id}",
    tag = "Suppliers",
    operation_id = "reviewSupplier",
    summary = "Review a supplier",
    description = "Sets status and feedback. Any status may follow any other. \
        Administrators only.",
    params(("id" = i32, Path, description = "Supplier ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Supplier reviewed", body = SupplierResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Supplier not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(supplier_id = id, status = %payload.status))]
pub async fn review_supplier(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> Result<Json<SupplierResponse>, AppError> {
    auth_user.require_admin()?;

    let reviewed = workflow(&state)
        .review(id, payload.status, &payload.feedback)
        .await?;

    Ok(Json(suppliers::to_response(&state.db, reviewed).await?))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Suppliers",
    operation_id = "listOwnSuppliers",
    summary = "List the caller's suppliers",
    responses(
        (status = 200, description = "Own non-deleted suppliers", body = Vec<SupplierResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn my_suppliers(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SupplierResponse>>, AppError> {
    auth_user.require_regular()?;

    let rows = suppliers::owned_by(&state.db, auth_user.user_id()).await?;
    Ok(Json(suppliers::to_responses(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/me/feedback",
    tag = "Suppliers",
    operation_id = "listOwnSupplierFeedback",
    summary = "Review status and feedback of the caller's suppliers",
    responses(
        (status = 200, description = "Status and feedback", body = Vec<SupplierFeedbackResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn my_feedback(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SupplierFeedbackResponse>>, AppError> {
    auth_user.require_regular()?;
    Ok(Json(suppliers::feedback_of(&state.db, auth_user.user_id()).await?))
}

#[utoipa::path(
    get,
    path = "/statistics",
    tag = "Suppliers",
    operation_id = "supplierStatistics",
    summary = "Supplier counts for the current month",
    description = "Suppliers created since the first of the month (UTC), by status and by category.",
    responses(
        (status = 200, description = "Monthly statistics", body = SupplierStatisticsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn statistics(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SupplierStatisticsResponse>, AppError> {
    auth_user.require_admin()?;
    Ok(Json(suppliers::monthly_statistics(&state.db).await?))
}
