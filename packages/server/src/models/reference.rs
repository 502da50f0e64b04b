use serde::{Deserialize, Serialize};

use crate::entity::{category, country, province};
use crate::error::AppError;
use crate::models::shared::{require_non_blank, validate_max_chars};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CountryRef {
    pub id: i32,
    pub name: String,
}

impl From<country::Model> for CountryRef {
    fn from(c: country::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvinceRef {
    pub id: i32,
    pub name: String,
    pub country_id: i32,
}

impl From<province::Model> for ProvinceRef {
    fn from(p: province::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            country_id: p.country_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
}

impl From<category::Model> for CategoryRef {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

/// Category with its image.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    /// Image URL; absent only if the category was created without one.
    pub image: Option<String>,
}

/// Request body for a new country.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCountryRequest {
    #[schema(example = "Argentina")]
    pub name: String,
}

/// Request body for a new province.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProvinceRequest {
    #[schema(example = "Mendoza")]
    pub name: String,
    #[schema(example = 1)]
    pub country_id: i32,
}

/// Category fields sent as the `category` JSON part of a multipart request.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CategoryRequest {
    #[schema(example = "Agroecología")]
    pub name: String,
}

const MAX_NAME_CHARS: usize = 255;

/// Validate and trim a reference-data name.
pub fn normalize_name(name: &str) -> Result<String, AppError> {
    require_non_blank("Name", name)?;
    let name = name.trim();
    validate_max_chars("Name", name, MAX_NAME_CHARS)?;
    Ok(name.to_string())
}
