//! Countries, provinces and categories.

use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Func};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{category, country, province};
use crate::error::AppError;
use crate::models::reference::CategoryResponse;
use crate::services::assets::{self, AssetOwner, AssetService, ValidatedImage};

fn unique_violation(what: &str, name: &str) -> impl FnOnce(DbErr) -> AppError {
    let message = format!("{what} '{name}' already exists");
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message),
        _ => AppError::from(e),
    }
}

pub async fn countries<C: ConnectionTrait>(conn: &C) -> Result<Vec<country::Model>, DbErr> {
    country::Entity::find()
        .order_by_asc(country::Column::Name)
        .all(conn)
        .await
}

pub async fn create_country<C: ConnectionTrait>(
    conn: &C,
    name: String,
) -> Result<country::Model, AppError> {
    let taken = country::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(country::Column::Name))).eq(name.to_lowercase()))
        .count(conn)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!("Country '{name}' already exists")));
    }

    let created = country::ActiveModel {
        name: Set(name.clone()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(unique_violation("Country", &name))?;
    info!(country_id = created.id, name = %created.name, "Country created");
    Ok(created)
}

pub async fn provinces_of<C: ConnectionTrait>(
    conn: &C,
    country_id: i32,
) -> Result<Vec<province::Model>, AppError> {
    country::Entity::find_by_id(country_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Country not found".into()))?;

    Ok(province::Entity::find()
        .filter(province::Column::CountryId.eq(country_id))
        .order_by_asc(province::Column::Name)
        .all(conn)
        .await?)
}

/// Province names are unique within their country, ignoring case.
pub async fn create_province<C: ConnectionTrait>(
    conn: &C,
    name: String,
    country_id: i32,
) -> Result<province::Model, AppError> {
    country::Entity::find_by_id(country_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Country {country_id} does not exist")))?;

    let taken = province::Entity::find()
        .filter(province::Column::CountryId.eq(country_id))
        .filter(Expr::expr(Func::lower(Expr::col(province::Column::Name))).eq(name.to_lowercase()))
        .count(conn)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!("Province '{name}' already exists")));
    }

    let created = province::ActiveModel {
        name: Set(name),
        country_id: Set(country_id),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    info!(province_id = created.id, country_id, "Province created");
    Ok(created)
}

pub async fn categories<C: ConnectionTrait>(conn: &C) -> Result<Vec<CategoryResponse>, DbErr> {
    let rows = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(conn)
        .await?;
    with_images(conn, rows).await
}

pub async fn category<C: ConnectionTrait>(conn: &C, id: i32) -> Result<CategoryResponse, AppError> {
    let row = category::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
    with_images(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("category vanished while loading".into()))
}

async fn with_images<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<category::Model>,
) -> Result<Vec<CategoryResponse>, DbErr> {
    let mut images = assets::paths_by_owner(conn, "category", rows.iter().map(|c| c.id)).await?;
    Ok(rows
        .into_iter()
        .map(|c| CategoryResponse {
            image: images.remove(&c.id).and_then(|paths| paths.into_iter().next()),
            id: c.id,
            name: c.name,
        })
        .collect())
}

async fn category_name_taken<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    except: Option<i32>,
) -> Result<bool, DbErr> {
    let mut select = category::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(category::Column::Name))).eq(name.to_lowercase()));
    if let Some(id) = except {
        select = select.filter(category::Column::Id.ne(id));
    }
    Ok(select.count(conn).await? > 0)
}

/// Category writes. Each category carries exactly one image.
pub struct CategoryService<'a> {
    db: &'a DatabaseConnection,
    assets: AssetService<'a>,
}

impl<'a> CategoryService<'a> {
    pub fn new(db: &'a DatabaseConnection, assets: AssetService<'a>) -> Self {
        Self { db, assets }
    }

    pub async fn create(
        &self,
        name: String,
        image: ValidatedImage,
    ) -> Result<category::Model, AppError> {
        if category_name_taken(self.db, &name, None).await? {
            return Err(AppError::Conflict(format!("Category '{name}' already exists")));
        }

        let txn = self.db.begin().await?;
        let created = category::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(unique_violation("Category", &name))?;

        let pending = self
            .assets
            .replace(&txn, AssetOwner::Category(created.id), vec![image])
            .await?;
        if let Err(e) = txn.commit().await {
            self.assets.abort(pending).await;
            return Err(e.into());
        }
        self.assets.complete(pending).await;

        info!(category_id = created.id, name = %created.name, "Category created");
        Ok(created)
    }

    /// Rename a category and swap its image.
    pub async fn update(
        &self,
        id: i32,
        name: String,
        image: ValidatedImage,
    ) -> Result<category::Model, AppError> {
        let txn = self.db.begin().await?;
        let existing = category::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
        if category_name_taken(&txn, &name, Some(id)).await? {
            return Err(AppError::Conflict(format!("Category '{name}' already exists")));
        }

        let mut active = existing.into_active_model();
        active.name = Set(name.clone());
        let updated = active
            .update(&txn)
            .await
            .map_err(unique_violation("Category", &name))?;

        let pending = self
            .assets
            .replace(&txn, AssetOwner::Category(id), vec![image])
            .await?;
        if let Err(e) = txn.commit().await {
            self.assets.abort(pending).await;
            return Err(e.into());
        }
        let outcome = self.assets.complete(pending).await;
        if !outcome.orphaned.is_empty() {
            warn!(category_id = id, orphaned = ?outcome.orphaned, "Category image left behind in storage");
        }

        Ok(updated)
    }
}
