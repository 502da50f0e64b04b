use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, LockType};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::publication;
use crate::error::AppError;
use crate::extractors::auth::Identity;
use crate::models::publication::{
    PublicationRequest, PublicationResponse, PublicationStatisticsResponse,
};
use crate::services::assets::{self, AssetOwner, AssetService, ValidatedImage};

/// Mutations of publications. Callers check that the identity is an administrator.
pub struct PublicationService<'a> {
    db: &'a DatabaseConnection,
    assets: AssetService<'a>,
}

impl<'a> PublicationService<'a> {
    pub fn new(db: &'a DatabaseConnection, assets: AssetService<'a>) -> Self {
        Self { db, assets }
    }

    pub async fn create(
        &self,
        author: &Identity,
        payload: PublicationRequest,
        images: Vec<ValidatedImage>,
    ) -> Result<publication::Model, AppError> {
        require_images(&images)?;

        let txn = self.db.begin().await?;
        let created = publication::ActiveModel {
            title: Set(payload.title.trim().to_string()),
            description: Set(payload.description.trim().to_string()),
            user_id: Set(author.user_id),
            deleted: Set(false),
            visualizations_amount: Set(0),
            date_of_creation: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let pending = self
            .assets
            .replace(&txn, AssetOwner::Publication(created.id), images)
            .await?;
        if let Err(e) = txn.commit().await {
            self.assets.abort(pending).await;
            return Err(e.into());
        }
        self.assets.complete(pending).await;

        info!(publication_id = created.id, "Publication created");
        Ok(created)
    }

    /// Overwrite title, description and the full image set.
    pub async fn update(
        &self,
        id: i32,
        payload: PublicationRequest,
        images: Vec<ValidatedImage>,
    ) -> Result<publication::Model, AppError> {
        require_images(&images)?;

        let txn = self.db.begin().await?;
        let existing = publication::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(not_found)?;

        let mut active = existing.into_active_model();
        active.title = Set(payload.title.trim().to_string());
        active.description = Set(payload.description.trim().to_string());
        let updated = active.update(&txn).await?;

        let pending = self
            .assets
            .replace(&txn, AssetOwner::Publication(id), images)
            .await?;
        if let Err(e) = txn.commit().await {
            self.assets.abort(pending).await;
            return Err(e.into());
        }
        let outcome = self.assets.complete(pending).await;
        if !outcome.orphaned.is_empty() {
            warn!(publication_id = id, orphaned = ?outcome.orphaned, "Publication images left behind in storage");
        }

        Ok(updated)
    }

    pub async fn soft_delete(&self, id: i32) -> Result<(), AppError> {
        let existing = find(self.db, id).await?;
        if existing.deleted {
            return Ok(());
        }
        let mut active = existing.into_active_model();
        active.deleted = Set(true);
        active.update(self.db).await?;
        Ok(())
    }

    /// Remove the publication and its images. Returns storage keys that could not
    /// be deleted.
    pub async fn hard_delete(&self, id: i32) -> Result<Vec<String>, AppError> {
        let txn = self.db.begin().await?;
        find(&txn, id).await?;

        let owner = AssetOwner::Publication(id);
        let detached = self.assets.detach_all(&txn, owner).await?;
        publication::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        let orphaned = self.assets.discard_assets(owner, detached).await;
        info!(publication_id = id, orphaned = orphaned.len(), "Publication deleted");
        Ok(orphaned)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Publication not found".into())
}

pub async fn find<C: ConnectionTrait>(conn: &C, id: i32) -> Result<publication::Model, AppError> {
    publication::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(not_found)
}

pub async fn list_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<publication::Model>, DbErr> {
    publication::Entity::find()
        .order_by_asc(publication::Column::Id)
        .all(conn)
        .await
}

pub async fn list_active<C: ConnectionTrait>(conn: &C) -> Result<Vec<publication::Model>, DbErr> {
    publication::Entity::find()
        .filter(publication::Column::Deleted.eq(false))
        .order_by_asc(publication::Column::Id)
        .all(conn)
        .await
}

/// Add one view in a single `UPDATE`, so concurrent readers never lose a count.
pub async fn increment<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), AppError> {
    let result = publication::Entity::update_many()
        .col_expr(
            publication::Column::VisualizationsAmount,
            Expr::col(publication::Column::VisualizationsAmount).add(1),
        )
        .filter(publication::Column::Id.eq(id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    Ok(())
}

/// Fetch a publication for display and count the view.
///
/// Deleted publications are only visible to administrators and are not counted.
pub async fn view<C: ConnectionTrait>(
    conn: &C,
    viewer: Option<&Identity>,
    id: i32,
) -> Result<publication::Model, AppError> {
    let found = find(conn, id).await?;
    if found.deleted {
        if viewer.is_some_and(Identity::is_admin) {
            return Ok(found);
        }
        return Err(not_found());
    }

    increment(conn, id).await?;
    find(conn, id).await
}

pub async fn statistics<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<PublicationStatisticsResponse>, DbErr> {
    Ok(list_all(conn)
        .await?
        .into_iter()
        .map(|p| PublicationStatisticsResponse {
            title: p.title,
            visualizations_amount: p.visualizations_amount,
            date_of_creation: p.date_of_creation,
        })
        .collect())
}

pub async fn to_responses<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<publication::Model>,
) -> Result<Vec<PublicationResponse>, DbErr> {
    let mut images = assets::paths_by_owner(conn, "publication", rows.iter().map(|p| p.id)).await?;
    Ok(rows
        .into_iter()
        .map(|p| PublicationResponse {
            images: images.remove(&p.id).unwrap_or_default(),
            id: p.id,
            title: p.title,
            description: p.description,
            user_id: p.user_id,
            deleted: p.deleted,
            visualizations_amount: p.visualizations_amount,
            date_of_creation: p.date_of_creation,
        })
        .collect())
}

pub async fn to_response<C: ConnectionTrait>(
    conn: &C,
    row: publication::Model,
) -> Result<PublicationResponse, AppError> {
    to_responses(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("publication vanished while loading".into()))
}

fn require_images(images: &[ValidatedImage]) -> Result<(), AppError> {
    if images.is_empty() {
        return Err(AppError::Validation("At least one image is required".into()));
    }
    Ok(())
}
