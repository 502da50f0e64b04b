use std::collections::HashMap;

use chrono::Utc;
use common::SupplierStatus;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};

use crate::entity::{category, country, province, supplier, user};
use crate::error::AppError;
use crate::extractors::auth::Identity;
use crate::models::reference::{CategoryRef, CountryRef, ProvinceRef};
use crate::models::supplier::{
    CategoryStatistics, SupplierFeedbackResponse, SupplierRequest, SupplierResponse,
    SupplierStatisticsResponse, SupplierSummary, SuppliersByStatusResponse,
};
use crate::services::assets::{self, AssetOwner, AssetService, ValidatedImage};
use crate::utils::time::month_start;

/// Non-deleted suppliers a single user may own at once.
pub const MAX_SUPPLIERS_PER_USER: u64 = 3;

/// Review workflow and mutations of supplier listings.
pub struct SupplierWorkflow<'a> {
    db: &'a DatabaseConnection,
    assets: AssetService<'a>,
}

impl<'a> SupplierWorkflow<'a> {
    pub fn new(db: &'a DatabaseConnection, assets: AssetService<'a>) -> Self {
        Self { db, assets }
    }

    /// Create a listing in `REVISION_INICIAL` owned by `identity`.
    ///
    /// The owner's row is locked for the whole transaction so that concurrent
    /// creates by the same user cannot both pass the quota check.
    pub async fn create(
        &self,
        identity: &Identity,
        payload: SupplierRequest,
        images: Vec<ValidatedImage>,
    ) -> Result<supplier::Model, AppError> {
        require_images(&images)?;
        check_references(self.db, &payload).await?;

        let txn = self.db.begin().await?;

        if !claim_user(&txn, identity.user_id).await? {
            return Err(AppError::TokenInvalid);
        }

        let owned = supplier::Entity::find()
            .filter(supplier::Column::UserId.eq(identity.user_id))
            .filter(supplier::Column::Deleted.eq(false))
            .count(&txn)
            .await?;
        if owned >= MAX_SUPPLIERS_PER_USER {
            return Err(AppError::QuotaExceeded(format!(
                "A user may own at most {MAX_SUPPLIERS_PER_USER} suppliers"
            )));
        }

        let created = supplier::ActiveModel {
            name: Set(payload.name.trim().to_string()),
            description: Set(payload.description.trim().to_string()),
            short_description: Set(payload.short_description.trim().to_string()),
            phone: Set(payload.phone.trim().to_string()),
            email: Set(payload.email.trim().to_string()),
            facebook: Set(non_blank(payload.facebook)),
            instagram: Set(non_blank(payload.instagram)),
            country_id: Set(payload.country_id),
            province_id: Set(payload.province_id),
            city: Set(payload.city.trim().to_string()),
            category_id: Set(payload.category_id),
            user_id: Set(identity.user_id),
            status: Set(SupplierStatus::RevisionInicial),
            feedback: Set(SupplierStatus::INITIAL_FEEDBACK.to_string()),
            deleted: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let pending = self
            .assets
            .replace(&txn, AssetOwner::Supplier(created.id), images)
            .await?;
        if let Err(e) = txn.commit().await {
            self.assets.abort(pending).await;
            return Err(e.into());
        }
        self.assets.complete(pending).await;

        info!(supplier_id = created.id, user_id = identity.user_id, "Supplier created");
        Ok(created)
    }

    /// Owner edit: overwrite every field and image, then send the listing back to review.
    pub async fn update(
        &self,
        identity: &Identity,
        id: i32,
        payload: SupplierRequest,
        images: Vec<ValidatedImage>,
    ) -> Result<supplier::Model, AppError> {
        require_images(&images)?;

        let txn = self.db.begin().await?;
        if !claim_supplier(&txn, id).await? {
            return Err(AppError::NotFound("Supplier not found".into()));
        }
        let existing = supplier::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .filter(|s| !s.deleted)
            .ok_or_else(|| AppError::NotFound("Supplier not found".into()))?;
        if existing.user_id != identity.user_id {
            return Err(AppError::PermissionDenied);
        }
        check_references(&txn, &payload).await?;

        let mut active = existing.into_active_model();
        active.name = Set(payload.name.trim().to_string());
        active.description = Set(payload.description.trim().to_string());
        active.short_description = Set(payload.short_description.trim().to_string());
        active.phone = Set(payload.phone.trim().to_string());
        active.email = Set(payload.email.trim().to_string());
        active.facebook = Set(non_blank(payload.facebook));
        active.instagram = Set(non_blank(payload.instagram));
        active.country_id = Set(payload.country_id);
        active.province_id = Set(payload.province_id);
        active.city = Set(payload.city.trim().to_string());
        active.category_id = Set(payload.category_id);
        active.status = Set(SupplierStatus::RevisionInicial);
        active.feedback = Set(SupplierStatus::INITIAL_FEEDBACK.to_string());
        let updated = active.update(&txn).await?;

        let pending = self
            .assets
            .replace(&txn, AssetOwner::Supplier(id), images)
            .await?;
        if let Err(e) = txn.commit().await {
            self.assets.abort(pending).await;
            return Err(e.into());
        }
        let outcome = self.assets.complete(pending).await;
        if !outcome.orphaned.is_empty() {
            warn!(supplier_id = id, orphaned = ?outcome.orphaned, "Supplier images left behind in storage");
        }

        Ok(updated)
    }

    /// Admin review: set status and feedback, nothing else.
    pub async fn review(
        &self,
        id: i32,
        status: SupplierStatus,
        feedback: &str,
    ) -> Result<supplier::Model, AppError> {
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(AppError::Validation("Feedback must not be blank".into()));
        }

        let existing = find(self.db, id).await?;
        let previous = existing.status;

        let mut active = existing.into_active_model();
        active.status = Set(status);
        active.feedback = Set(feedback.to_string());
        let updated = active.update(self.db).await?;

        info!(supplier_id = id, from = %previous, to = %status, "Supplier reviewed");
        Ok(updated)
    }

    /// Hide a listing from discovery. Allowed for its owner and administrators.
    pub async fn soft_delete(&self, identity: &Identity, id: i32) -> Result<(), AppError> {
        let existing = find(self.db, id).await?;
        if existing.user_id != identity.user_id && !identity.is_admin() {
            return Err(AppError::PermissionDenied);
        }
        if existing.deleted {
            return Ok(());
        }

        let mut active = existing.into_active_model();
        active.deleted = Set(true);
        active.update(self.db).await?;
        Ok(())
    }

    /// Remove a listing and its images for good. Returns storage keys that could
    /// not be deleted.
    pub async fn hard_delete(&self, id: i32) -> Result<Vec<String>, AppError> {
        let txn = self.db.begin().await?;
        find(&txn, id).await?;

        let owner = AssetOwner::Supplier(id);
        let detached = self.assets.detach_all(&txn, owner).await?;
        supplier::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        let orphaned = self.assets.discard_assets(owner, detached).await;
        info!(supplier_id = id, orphaned = orphaned.len(), "Supplier deleted");
        Ok(orphaned)
    }
}

/// Lookup by id, including soft-deleted listings.
pub async fn find<C: ConnectionTrait>(conn: &C, id: i32) -> Result<supplier::Model, AppError> {
    supplier::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier not found".into()))
}

/// Lock the owner's row for the rest of the transaction with a no-op write.
/// Returns `false` when the user does not exist.
///
/// SQLite ignores `FOR UPDATE`; a write as the first statement takes its write
/// lock up front, so concurrent creates wait on the busy timeout.
async fn claim_user<C: ConnectionTrait>(txn: &C, user_id: i32) -> Result<bool, DbErr> {
    let touched = user::Entity::update_many()
        .col_expr(user::Column::Deleted, Expr::col(user::Column::Deleted))
        .filter(user::Column::Id.eq(user_id))
        .exec(txn)
        .await?;
    Ok(touched.rows_affected > 0)
}

/// Lock a supplier row the same way as [`claim_user`].
async fn claim_supplier<C: ConnectionTrait>(txn: &C, id: i32) -> Result<bool, DbErr> {
    let touched = supplier::Entity::update_many()
        .col_expr(supplier::Column::Deleted, Expr::col(supplier::Column::Deleted))
        .filter(supplier::Column::Id.eq(id))
        .exec(txn)
        .await?;
    Ok(touched.rows_affected > 0)
}

/// Lookup by id as seen by `viewer`: only administrators see deleted listings.
pub async fn find_visible<C: ConnectionTrait>(
    conn: &C,
    viewer: Option<&Identity>,
    id: i32,
) -> Result<supplier::Model, AppError> {
    let found = find(conn, id).await?;
    if found.deleted && !viewer.is_some_and(Identity::is_admin) {
        return Err(AppError::NotFound("Supplier not found".into()));
    }
    Ok(found)
}

/// The caller's non-deleted listings, oldest first.
pub async fn owned_by<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Vec<supplier::Model>, DbErr> {
    supplier::Entity::find()
        .filter(supplier::Column::UserId.eq(user_id))
        .filter(supplier::Column::Deleted.eq(false))
        .order_by_asc(supplier::Column::Id)
        .all(conn)
        .await
}

pub async fn feedback_of<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Vec<SupplierFeedbackResponse>, DbErr> {
    Ok(owned_by(conn, user_id)
        .await?
        .into_iter()
        .map(|s| SupplierFeedbackResponse {
            id: s.id,
            name: s.name,
            status: s.status,
            feedback: s.feedback,
        })
        .collect())
}

/// Admin overview of every non-deleted listing, bucketed by status.
pub async fn grouped_by_status<C: ConnectionTrait>(
    conn: &C,
) -> Result<SuppliersByStatusResponse, DbErr> {
    let rows = supplier::Entity::find()
        .filter(supplier::Column::Deleted.eq(false))
        .order_by_asc(supplier::Column::Id)
        .all(conn)
        .await?;
    let category_names = category_names(conn, rows.iter().map(|s| s.category_id)).await?;

    let mut grouped = SuppliersByStatusResponse::default();
    for row in rows {
        let summary = SupplierSummary {
            id: row.id,
            category: category_names
                .get(&row.category_id)
                .cloned()
                .unwrap_or_default(),
            name: row.name,
        };
        let bucket = match row.status {
            SupplierStatus::RevisionInicial => &mut grouped.new_suppliers,
            SupplierStatus::RequiereCambios => &mut grouped.review_suppliers,
            SupplierStatus::Aceptado => &mut grouped.approved_suppliers,
            SupplierStatus::Denegado => &mut grouped.denied_suppliers,
            SupplierStatus::CambiosRealizados => &mut grouped.changes_made_suppliers,
        };
        bucket.push(summary);
    }
    Ok(grouped)
}

/// Counts of listings created since the first day of the current month (UTC).
pub async fn monthly_statistics<C: ConnectionTrait>(
    conn: &C,
) -> Result<SupplierStatisticsResponse, DbErr> {
    let since = month_start(Utc::now());

    let this_month = || {
        supplier::Entity::find().filter(supplier::Column::CreatedAt.gte(since))
    };

    let approved = this_month()
        .filter(supplier::Column::Status.eq(SupplierStatus::Aceptado))
        .count(conn)
        .await?;
    let in_review = this_month()
        .filter(supplier::Column::Status.eq(SupplierStatus::RevisionInicial))
        .count(conn)
        .await?;
    let denied = this_month()
        .filter(supplier::Column::Status.eq(SupplierStatus::Denegado))
        .count(conn)
        .await?;

    let categories = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(conn)
        .await?;
    let mut per_category = Vec::with_capacity(categories.len());
    for c in categories {
        let registered = this_month()
            .filter(supplier::Column::CategoryId.eq(c.id))
            .count(conn)
            .await?;
        per_category.push(CategoryStatistics {
            name: c.name,
            registered,
        });
    }

    Ok(SupplierStatisticsResponse {
        approved,
        in_review,
        denied,
        categories: per_category,
    })
}

/// Attach country, province, category and image URLs to supplier rows.
pub async fn to_responses<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<supplier::Model>,
) -> Result<Vec<SupplierResponse>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let countries: HashMap<i32, country::Model> = country::Entity::find()
        .filter(country::Column::Id.is_in(rows.iter().map(|s| s.country_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let provinces: HashMap<i32, province::Model> = province::Entity::find()
        .filter(province::Column::Id.is_in(rows.iter().map(|s| s.province_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let categories: HashMap<i32, category::Model> = category::Entity::find()
        .filter(category::Column::Id.is_in(rows.iter().map(|s| s.category_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let mut images = assets::paths_by_owner(conn, "supplier", rows.iter().map(|s| s.id)).await?;

    let missing = |what: &str, id: i32| DbErr::RecordNotFound(format!("{what} {id}"));

    rows.into_iter()
        .map(|s| {
            let country = countries
                .get(&s.country_id)
                .cloned()
                .ok_or_else(|| missing("country", s.country_id))?;
            let province = provinces
                .get(&s.province_id)
                .cloned()
                .ok_or_else(|| missing("province", s.province_id))?;
            let category = categories
                .get(&s.category_id)
                .cloned()
                .ok_or_else(|| missing("category", s.category_id))?;

            Ok(SupplierResponse {
                images: images.remove(&s.id).unwrap_or_default(),
                id: s.id,
                name: s.name,
                description: s.description,
                short_description: s.short_description,
                phone: s.phone,
                email: s.email,
                facebook: s.facebook,
                instagram: s.instagram,
                country: CountryRef::from(country),
                province: ProvinceRef::from(province),
                city: s.city,
                category: CategoryRef::from(category),
                status: s.status,
                feedback: s.feedback,
                deleted: s.deleted,
                created_at: s.created_at,
            })
        })
        .collect()
}

pub async fn to_response<C: ConnectionTrait>(
    conn: &C,
    row: supplier::Model,
) -> Result<SupplierResponse, AppError> {
    to_responses(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("supplier vanished while loading".into()))
}

async fn category_names<C: ConnectionTrait>(
    conn: &C,
    ids: impl Iterator<Item = i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let ids: Vec<i32> = ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(category::Entity::find()
        .filter(category::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

/// Country, province and category must exist, and the province must belong to the country.
async fn check_references<C: ConnectionTrait>(
    conn: &C,
    payload: &SupplierRequest,
) -> Result<(), AppError> {
    country::Entity::find_by_id(payload.country_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Country {} does not exist", payload.country_id)))?;

    let province = province::Entity::find_by_id(payload.province_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!("Province {} does not exist", payload.province_id))
        })?;
    if province.country_id != payload.country_id {
        return Err(AppError::Validation(format!(
            "Province {} does not belong to country {}",
            payload.province_id, payload.country_id
        )));
    }

    category::Entity::find_by_id(payload.category_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!("Category {} does not exist", payload.category_id))
        })?;
    Ok(())
}

fn require_images(images: &[ValidatedImage]) -> Result<(), AppError> {
    if images.is_empty() {
        return Err(AppError::Validation("At least one image is required".into()));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
