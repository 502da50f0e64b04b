use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::{require_non_blank, validate_max_chars};

pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_DESCRIPTION_CHARS: usize = 7500;

/// Publication fields sent as the `publication` JSON part of a multipart request.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct PublicationRequest {
    /// At most 255 characters.
    #[schema(example = "Feria de productores de otoño")]
    pub title: String,
    /// At most 7500 characters.
    #[schema(example = "Este sábado se realiza la feria mensual de productores locales.")]
    pub description: String,
}

pub fn validate_publication_request(payload: &PublicationRequest) -> Result<(), AppError> {
    require_non_blank("Title", &payload.title)?;
    validate_max_chars("Title", payload.title.trim(), MAX_TITLE_CHARS)?;
    require_non_blank("Description", &payload.description)?;
    validate_max_chars("Description", payload.description.trim(), MAX_DESCRIPTION_CHARS)?;
    Ok(())
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicationResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Image URLs in display order.
    pub images: Vec<String>,
    pub user_id: i32,
    pub deleted: bool,
    pub visualizations_amount: i64,
    pub date_of_creation: DateTime<Utc>,
}

/// Per-publication view counter.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicationStatisticsResponse {
    pub title: String,
    pub visualizations_amount: i64,
    pub date_of_creation: DateTime<Utc>,
}
