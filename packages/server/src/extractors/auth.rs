use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use common::UserRole;

use crate::error::AppError;

/// Identity resolved by the authentication middleware for the current request.
///
/// Lives only in the request's extensions; services receive it as an explicit
/// argument instead of reading any shared context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub email: String,
    pub role: UserRole,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Administrador
    }
}

/// Authenticated user, available on every route behind the auth middleware.
///
/// Add this as a handler parameter to require a caller; anonymous requests are
/// answered with `TOKEN_MISSING`. Public reads that only adjust visibility take
/// `Option<AuthUser>`. Role checks happen via `require_admin()` /
/// `require_regular()` in the handler body.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn identity(&self) -> &Identity {
        &self.0
    }

    pub fn user_id(&self) -> i32 {
        self.0.user_id
    }

    /// Returns `Ok(())` for administrators, `Err(PermissionDenied)` otherwise.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.role == UserRole::Administrador {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Returns `Ok(())` for regular users, `Err(PermissionDenied)` otherwise.
    pub fn require_regular(&self) -> Result<(), AppError> {
        if self.0.role == UserRole::UsuarioRegular {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Inserted by `middleware::auth::authenticate` when the request carried a valid token.
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::TokenMissing)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().map(AuthUser))
    }
}
