use chrono::{DateTime, Utc};
use common::UserRole;
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

/// Request body for the Google sign-in exchange.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAuthRequest {
    /// ID token obtained by the client from Google Identity Services.
    #[schema(example = "eyJhbGciOiJSUzI1NiIsImtpZCI6Ij...")]
    pub token_id: String,
}

pub fn validate_google_auth_request(payload: &GoogleAuthRequest) -> Result<(), AppError> {
    if payload.token_id.trim().is_empty() {
        return Err(AppError::Validation("tokenId must not be empty".into()));
    }
    Ok(())
}

/// Public profile of a user.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[schema(example = "Ana")]
    pub first_name: String,
    #[schema(example = "García")]
    pub last_name: String,
    pub picture: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            picture: u.picture,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

/// Successful sign-in.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    /// Bearer token for every other endpoint, valid for 7 days by default.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// Users registered in the current calendar month (UTC).
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatisticsResponse {
    #[schema(example = 12)]
    pub created_this_month: u64,
}
