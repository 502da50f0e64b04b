use axum::{Json, extract::State};
use sea_orm::EntityTrait;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    AuthResponse, GoogleAuthRequest, UserResponse, UserStatisticsResponse,
    validate_google_auth_request,
};
use crate::services::identity::{self, IdentityError, SignIn};
use crate::state::AppState;
use crate::utils::jwt;

/// Exchange a Google ID token for a session token.
#[utoipa::path(
    post,
    path = "/googleAuth",
    tag = "Auth",
    operation_id = "googleAuth",
    summary = "Sign in with Google",
    description = "Verifies the Google ID token, creates the user on first sign-in and returns a \
        bearer token for the rest of the API.",
    request_body = GoogleAuthRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Token rejected (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Account deactivated (PERMISSION_DENIED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn google_auth(
    State(state): State<AppState>,
    AppJson(payload): AppJson<GoogleAuthRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_google_auth_request(&payload)?;

    let verified = state
        .identity_verifier
        .verify(payload.token_id.trim())
        .await
        .map_err(|e| match e {
            IdentityError::Rejected(reason) => {
                tracing::debug!("Google rejected ID token: {reason}");
                AppError::InvalidCredentials
            }
            IdentityError::Unavailable(e) => {
                AppError::Internal(format!("Identity provider unreachable: {e}"))
            }
        })?;

    let account = match identity::sign_in(&state.db, &state.config.auth, verified).await? {
        SignIn::Active(account) => account,
        SignIn::Deactivated => return Err(AppError::PermissionDenied),
    };

    let token = jwt::sign(
        &account,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(account),
    }))
}

/// Return the current authenticated user's profile.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getCurrentUser",
    summary = "Current user",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let account = user::Entity::find_by_id(auth_user.user_id())
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    Ok(Json(UserResponse::from(account)))
}

#[utoipa::path(
    get,
    path = "/user-statistics",
    tag = "Users",
    operation_id = "userStatistics",
    summary = "Users registered this month",
    responses(
        (status = 200, description = "Monthly registrations", body = UserStatisticsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn user_statistics(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserStatisticsResponse>, AppError> {
    auth_user.require_admin()?;
    Ok(Json(UserStatisticsResponse {
        created_this_month: identity::registered_this_month(&state.db).await?,
    }))
}
