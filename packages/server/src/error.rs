use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

use crate::services::assets::AssetError;
use crate::services::location::LocationError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `INVALID_QUERY`,
    /// `ASSET_INVALID`, `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`,
    /// `PERMISSION_DENIED`, `NOT_FOUND`, `CONFLICT`, `QUOTA_EXCEEDED`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Short description must be at most 50 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// A search was issued with unusable parameters.
    InvalidQuery(String),
    /// Uploaded files failed image validation or could not be stored.
    AssetInvalid(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    QuotaExceeded(String),
    /// The geocoder could not place the coordinates. Answered with an empty 204.
    NoLocationData,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::InvalidQuery(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_QUERY",
                    message: msg,
                },
            ),
            AppError::AssetInvalid(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "ASSET_INVALID",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Identity token was rejected".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::QuotaExceeded(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "QUOTA_EXCEEDED",
                    message: msg,
                },
            ),
            AppError::NoLocationData => (
                StatusCode::NO_CONTENT,
                ErrorBody {
                    code: "NO_LOCATION_DATA",
                    message: String::new(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();

        // 204 must not carry a body.
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Invalid(msg) => AppError::AssetInvalid(msg),
            AssetError::Upload(e) => {
                tracing::warn!("Image upload failed: {e}");
                AppError::AssetInvalid(format!("Image upload failed: {e}"))
            }
            AssetError::Database(e) => AppError::from(e),
        }
    }
}

impl From<LocationError> for AppError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::InvalidCoordinates(msg) => AppError::InvalidQuery(msg),
            LocationError::NoLocationData => AppError::NoLocationData,
        }
    }
}
