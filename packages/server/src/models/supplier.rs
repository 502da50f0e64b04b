use chrono::{DateTime, Utc};
use common::SupplierStatus;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::reference::{CategoryRef, CountryRef, ProvinceRef};
use crate::models::shared::{require_non_blank, validate_email, validate_max_chars};

/// Supplier fields sent as the `supplier` JSON part of a multipart request.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierRequest {
    #[schema(example = "Huerta Los Andes")]
    pub name: String,
    /// At most 300 characters.
    #[schema(example = "Organic vegetables grown at the foot of the Andes.")]
    pub description: String,
    /// At most 50 characters.
    #[schema(example = "Organic vegetables")]
    pub short_description: String,
    #[schema(example = "+54 261 555 0101")]
    pub phone: String,
    #[schema(example = "contacto@huerta.example")]
    pub email: String,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[schema(example = 1)]
    pub country_id: i32,
    #[schema(example = 3)]
    pub province_id: i32,
    #[schema(example = "Mendoza")]
    pub city: String,
    #[schema(example = 2)]
    pub category_id: i32,
}

pub const MAX_DESCRIPTION_CHARS: usize = 300;
pub const MAX_SHORT_DESCRIPTION_CHARS: usize = 50;

pub fn validate_supplier_request(payload: &SupplierRequest) -> Result<(), AppError> {
    require_non_blank("Name", &payload.name)?;
    require_non_blank("Description", &payload.description)?;
    validate_max_chars("Description", &payload.description, MAX_DESCRIPTION_CHARS)?;
    require_non_blank("Short description", &payload.short_description)?;
    validate_max_chars(
        "Short description",
        &payload.short_description,
        MAX_SHORT_DESCRIPTION_CHARS,
    )?;
    require_non_blank("Phone", &payload.phone)?;
    require_non_blank("Email", &payload.email)?;
    validate_email(&payload.email)?;
    require_non_blank("City", &payload.city)?;
    Ok(())
}

/// Admin review decision.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReviewRequest {
    pub status: SupplierStatus,
    /// Must not be blank.
    #[schema(example = "Please add a contact phone with area code")]
    pub feedback: String,
}

/// Full supplier listing.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub phone: String,
    pub email: String,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub country: CountryRef,
    pub province: ProvinceRef,
    pub city: String,
    pub category: CategoryRef,
    /// Image URLs in display order.
    pub images: Vec<String>,
    pub status: SupplierStatus,
    pub feedback: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// `{id, name}` pair for autocomplete.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SupplierNameResponse {
    pub id: i32,
    pub name: String,
}

/// Supplier entry in the admin overview.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SupplierSummary {
    pub id: i32,
    pub name: String,
    /// Category name.
    pub category: String,
}

/// All non-deleted suppliers grouped by review status.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuppliersByStatusResponse {
    /// `REVISION_INICIAL`
    pub new_suppliers: Vec<SupplierSummary>,
    /// `REQUIERE_CAMBIOS`
    pub review_suppliers: Vec<SupplierSummary>,
    /// `ACEPTADO`
    pub approved_suppliers: Vec<SupplierSummary>,
    /// `DENEGADO`
    pub denied_suppliers: Vec<SupplierSummary>,
    /// `CAMBIOS_REALIZADOS`
    pub changes_made_suppliers: Vec<SupplierSummary>,
}

/// Review state of one of the caller's listings.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SupplierFeedbackResponse {
    pub id: i32,
    pub name: String,
    pub status: SupplierStatus,
    pub feedback: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoryStatistics {
    pub name: String,
    /// Suppliers of this category created this month.
    pub registered: u64,
}

/// Counts of suppliers created in the current calendar month (UTC).
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierStatisticsResponse {
    pub approved: u64,
    pub in_review: u64,
    pub denied: u64,
    pub categories: Vec<CategoryStatistics>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct NameQuery {
    /// Case-insensitive substring of the supplier name.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CategoryQuery {
    /// Category name, matched case-insensitively.
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LocationQuery {
    pub lat: f64,
    pub lng: f64,
}
