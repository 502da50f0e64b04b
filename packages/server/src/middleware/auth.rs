use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::entity::user;
use crate::error::AppError;
use crate::extractors::auth::Identity;
use crate::state::AppState;
use crate::utils::jwt;

/// Resolve the bearer token into an [`Identity`] and attach it to the request.
///
/// Applied to every route outside `/api/auth`. A request without an
/// `Authorization` header passes through anonymously, and handlers that need a
/// caller reject it through the [`AuthUser`](crate::extractors::auth::AuthUser)
/// extractor. A header that is not a bearer token, a bad signature, a malformed or
/// expired token, or a subject that no longer maps to an active user answers
/// `TOKEN_INVALID` on every route, public ones included.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !request.headers().contains_key(header::AUTHORIZATION) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::TokenInvalid)?;

    let claims = jwt::verify(token, &state.config.auth.jwt_secret).map_err(|e| {
        debug!("Rejected bearer token: {e}");
        AppError::TokenInvalid
    })?;

    let account = user::Entity::find()
        .filter(user::Column::Email.eq(&claims.sub))
        .filter(user::Column::Deleted.eq(false))
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    request.extensions_mut().insert(Identity {
        user_id: account.id,
        email: account.email,
        role: account.role,
    });

    Ok(next.run(request).await)
}
