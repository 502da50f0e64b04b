use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::multipart::read_json_with_images;
use crate::models::reference::{
    CategoryRequest, CategoryResponse, CountryRef, CreateCountryRequest, CreateProvinceRequest,
    ProvinceRef, normalize_name,
};
use crate::services::assets::{AssetService, ValidatedImage, validate_image};
use crate::services::reference::{self, CategoryService};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Reference Data",
    operation_id = "listCountries",
    summary = "List countries",
    responses(
        (status = 200, description = "Countries by name", body = Vec<CountryRef>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn list_countries(
    State(state): State<AppState>,
) -> Result<Json<Vec<CountryRef>>, AppError> {
    let countries = reference::countries(&state.db).await?;
    Ok(Json(countries.into_iter().map(CountryRef::from).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Reference Data",
    operation_id = "createCountry",
    summary = "Create a country",
    request_body = CreateCountryRequest,
    responses(
        (status = 201, description = "Country created", body = CountryRef),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_country(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCountryRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    let name = normalize_name(&payload.name)?;
    let created = reference::create_country(&state.db, name).await?;
    Ok((StatusCode::CREATED, Json(CountryRef::from(created))))
}

#[utoipa::path(
    get,
    path = "/{id}/provinces",
    tag = "Reference Data",
    operation_id = "listProvincesOfCountry",
    summary = "List the provinces of a country",
    params(("id" = i32, Path, description = "Country ID")),
    responses(
        (status = 200, description = "Provinces by name", body = Vec<ProvinceRef>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Country not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state), fields(country_id = id))]
pub async fn list_provinces(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ProvinceRef>>, AppError> {
    let provinces = reference::provinces_of(&state.db, id).await?;
    Ok(Json(provinces.into_iter().map(ProvinceRef::from).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Reference Data",
    operation_id = "createProvince",
    summary = "Create a province",
    request_body = CreateProvinceRequest,
    responses(
        (status = 201, description = "Province created", body = ProvinceRef),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name taken in this country (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(country_id = payload.country_id))]
pub async fn create_province(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProvinceRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    let name = normalize_name(&payload.name)?;
    let created = reference::create_province(&state.db, name, payload.country_id).await?;
    Ok((StatusCode::CREATED, Json(ProvinceRef::from(created))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Reference Data",
    operation_id = "listCategories",
    summary = "List categories with their image",
    responses(
        (status = 200, description = "Categories", body = Vec<CategoryResponse>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    Ok(Json(reference::categories(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Reference Data",
    operation_id = "getCategory",
    summary = "Get a category",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state), fields(category_id = id))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, AppError> {
    Ok(Json(reference::category(&state.db, id).await?))
}

/// Parse a `category` JSON part plus exactly one `image` file.
async fn read_category_form(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<(String, ValidatedImage), AppError> {
    let form = read_json_with_images::<CategoryRequest>(multipart, "category", "image").await?;
    let name = normalize_name(&form.payload.name)?;

    let mut uploads = form.images.into_iter();
    let image = match (uploads.next(), uploads.next()) {
        (Some(image), None) => image,
        (None, _) => return Err(AppError::Validation("Missing 'image' field".into())),
        (Some(_), Some(_)) => {
            return Err(AppError::Validation("A category takes exactly one image".into()));
        }
    };
    let image = validate_image(image, state.config.storage.max_image_size)?;
    Ok((name, image))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Reference Data",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Multipart request with a `category` JSON part and exactly one `image` file.",
    request_body(content_type = "multipart/form-data", description = "`category` JSON part plus one `image` file"),
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, ASSET_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    let (name, image) = read_category_form(&state, &mut multipart).await?;

    let created = CategoryService::new(&state.db, AssetService::new(&*state.object_store))
        .create(name, image)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(reference::category(&state.db, created.id).await?),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Reference Data",
    operation_id = "updateCategory",
    summary = "Rename a category and replace its image",
    params(("id" = i32, Path, description = "Category ID")),
    request_body(content_type = "multipart/form-data", description = "`category` JSON part plus one `image` file"),
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, ASSET_INVALID)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(category_id = id))]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<CategoryResponse>, AppError> {
    auth_user.require_admin()?;
    let (name, image) = read_category_form(&state, &mut multipart).await?;

    CategoryService::new(&state.db, AssetService::new(&*state.object_store))
        .update(id, name, image)
        .await?;

    Ok(Json(reference::category(&state.db, id).await?))
}
